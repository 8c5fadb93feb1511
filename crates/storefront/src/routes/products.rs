//! Catalog route handlers.
//!
//! One detail page serves every product type; the price shown for a
//! (variant, color) pick comes from [`selection_price`] and is re-rendered
//! through the `/products/{id}/price` HTMX fragment.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::pricing::{DisplayPrice, PriceSelection, display_price};
use mobistore_core::validation::{CommentForm, empty_string_as_none};
use mobistore_core::{CommentId, ProductId, VariantId};

use super::views::{ProductCardView, format_datetime, product_cards};
use super::{PageContext, set_flash};
use crate::backend::{ColorVariant, Comment, Product, ProductQuery};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, RequireAuth};
use crate::models::Flash;
use crate::state::AppState;

const PAGE_SIZE: u32 = 12;

/// Sort options offered on the listing, as (backend value, label).
pub const SORT_OPTIONS: [(&str, &str); 5] = [
    ("-createdAt", "Mới nhất"),
    ("price", "Giá tăng dần"),
    ("-price", "Giá giảm dần"),
    ("-rating", "Đánh giá cao"),
    ("name", "Tên A-Z"),
];

/// Brands offered as quick filters.
pub const BRANDS: [&str; 6] = ["Apple", "Samsung", "Xiaomi", "OPPO", "vivo", "realme"];

// =============================================================================
// Pricing
// =============================================================================

/// Price for a product with an optional variant and color picked.
///
/// Unknown ids fall back to the base product price.
#[must_use]
pub fn selection_price(
    product: &Product,
    variant_id: Option<&VariantId>,
    color: Option<&str>,
    colors: &[ColorVariant],
) -> DisplayPrice {
    let variant = variant_id.and_then(|id| product.variant(id));
    let color_adjustment = color
        .and_then(|name| colors.iter().find(|c| c.color.eq_ignore_ascii_case(name)))
        .and_then(|c| c.price_adjustment);

    display_price(&PriceSelection {
        base_price: product.price,
        discount_percent: product.discount,
        variant_price: variant.and_then(|v| v.price),
        condition: variant.map(|v| v.condition).unwrap_or_default(),
        color_adjustment,
    })
}

// =============================================================================
// View Types
// =============================================================================

#[derive(Clone)]
pub struct PriceView {
    pub price: String,
    pub original_price: Option<String>,
    pub saved_percent: u32,
}

impl From<DisplayPrice> for PriceView {
    fn from(price: DisplayPrice) -> Self {
        Self {
            price: price.final_price.display(),
            original_price: price.has_saving().then(|| price.original.display()),
            saved_percent: price.saved_percent,
        }
    }
}

#[derive(Clone)]
pub struct VariantOptionView {
    pub id: String,
    pub title: String,
    pub in_stock: bool,
}

#[derive(Clone)]
pub struct ColorOptionView {
    pub name: String,
    pub code: String,
    pub in_stock: bool,
}

#[derive(Clone)]
pub struct SpecView {
    pub name: String,
    pub value: String,
}

#[derive(Clone)]
pub struct ReplyView {
    pub author: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Clone)]
pub struct CommentView {
    pub id: String,
    pub author: String,
    pub content: String,
    pub rating: u8,
    pub created_at: String,
    pub replies: Vec<ReplyView>,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id.to_string(),
            author: author_name(comment.user.as_ref().map(|a| a.name.as_str())),
            content: comment.content.clone(),
            rating: comment.rating.unwrap_or(0),
            created_at: format_datetime(comment.created_at),
            replies: comment
                .replies
                .iter()
                .map(|reply| ReplyView {
                    author: author_name(reply.user.as_ref().map(|a| a.name.as_str())),
                    content: reply.content.clone(),
                    created_at: format_datetime(reply.created_at),
                })
                .collect(),
        }
    }
}

fn author_name(name: Option<&str>) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("Khách hàng")
        .to_string()
}

#[derive(Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub images: Vec<String>,
    pub rating: String,
    pub in_stock: bool,
    pub variants: Vec<VariantOptionView>,
    pub colors: Vec<ColorOptionView>,
    pub specs: Vec<SpecView>,
}

impl ProductDetailView {
    fn new(product: &Product, colors: &[ColorVariant]) -> Self {
        let mut images = product.images.clone();
        for color in colors {
            for image in &color.images {
                if !images.contains(image) {
                    images.push(image.clone());
                }
            }
        }

        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            brand: product.brand.clone().unwrap_or_default(),
            description: product.description.clone().unwrap_or_default(),
            images,
            rating: product.rating.map(|r| format!("{r:.1}")).unwrap_or_default(),
            in_stock: product.stock > 0
                || product.variants.iter().any(|v| v.stock > 0)
                || colors.iter().any(|c| c.stock > 0),
            variants: product
                .variants
                .iter()
                .map(|v| VariantOptionView {
                    id: v.id.to_string(),
                    title: v.title(),
                    in_stock: v.stock > 0,
                })
                .collect(),
            colors: colors
                .iter()
                .map(|c| ColorOptionView {
                    name: c.color.clone(),
                    code: c.color_code.clone().unwrap_or_default(),
                    in_stock: c.stock > 0,
                })
                .collect(),
            specs: product
                .specifications
                .iter()
                .map(|(name, value)| SpecView {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }
}

/// One choice in the sort or brand filter.
#[derive(Clone)]
pub struct FilterOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl FilterOption {
    fn new(value: &'static str, label: &'static str, current: &str) -> Self {
        Self {
            value,
            label,
            selected: value == current,
        }
    }
}

/// Page link in the listing pager.
#[derive(Clone)]
pub struct PageLink {
    pub number: u32,
    pub url: String,
    pub current: bool,
}

// =============================================================================
// Query / Form Types
// =============================================================================

/// Listing filters from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
    pub sort: Option<String>,
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub min_price: Option<u64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub max_price: Option<u64>,
}

impl ListingQuery {
    fn to_backend(&self) -> ProductQuery {
        ProductQuery {
            page: Some(self.page.unwrap_or(1).max(1)),
            limit: Some(PAGE_SIZE),
            sort: self
                .sort
                .clone()
                .filter(|s| SORT_OPTIONS.iter().any(|(value, _)| value == s)),
            brand: self.brand.clone().filter(|b| !b.trim().is_empty()),
            min_price: self.min_price,
            max_price: self.max_price.filter(|max| *max > 0),
        }
    }

    /// Listing URL for `page` with the other filters kept.
    fn page_url(&self, page: u32) -> String {
        let mut pairs = vec![format!("page={page}")];
        if let Some(sort) = &self.sort {
            pairs.push(format!("sort={}", urlencoding::encode(sort)));
        }
        if let Some(brand) = &self.brand {
            pairs.push(format!("brand={}", urlencoding::encode(brand)));
        }
        if let Some(min) = self.min_price {
            pairs.push(format!("min_price={min}"));
        }
        if let Some(max) = self.max_price {
            pairs.push(format!("max_price={max}"));
        }
        format!("/products?{}", pairs.join("&"))
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Selection sent by the variant/color pickers.
#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub variant: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyForm {
    pub content: String,
    pub product_id: String,
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCardView>,
    pub total: u64,
    pub pages: Vec<PageLink>,
    pub sort: String,
    pub brand: String,
    pub min_price: String,
    pub max_price: String,
    pub sort_options: Vec<FilterOption>,
    pub brands: Vec<FilterOption>,
}

#[derive(Template, WebTemplate)]
#[template(path = "products/search.html")]
pub struct SearchTemplate {
    pub page: PageContext,
    pub query: String,
    pub products: Vec<ProductCardView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductDetailView,
    pub price: PriceView,
    pub related: Vec<ProductCardView>,
    pub comments: Vec<CommentView>,
    pub logged_in: bool,
}

/// Price block fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/price.html")]
pub struct PriceTemplate {
    pub price: PriceView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Product listing.
#[instrument(skip(state, session, user, nonce))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<ListingQuery>,
) -> impl IntoResponse {
    let backend_query = query.to_backend();
    let result = state.backend().list_products(&backend_query).await;

    let (products, total, current, page_count) = match result {
        Ok(page) => (
            product_cards(&page.products),
            page.total,
            page.page.max(1),
            page.pages.max(1),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list products");
            (Vec::new(), 0, 1, 1)
        }
    };

    let pages = (1..=page_count)
        .map(|number| PageLink {
            number,
            url: query.page_url(number),
            current: number == current,
        })
        .collect();

    let sort = backend_query.sort.unwrap_or_default();
    let brand_filter = backend_query.brand.unwrap_or_default();

    ProductsIndexTemplate {
        page: PageContext::load(&session, user.as_ref(), nonce, "Điện thoại").await,
        products,
        total,
        pages,
        min_price: query.min_price.map(|v| v.to_string()).unwrap_or_default(),
        max_price: query.max_price.map(|v| v.to_string()).unwrap_or_default(),
        sort_options: SORT_OPTIONS
            .iter()
            .map(|&(value, label)| FilterOption::new(value, label, &sort))
            .collect(),
        brands: BRANDS
            .iter()
            .map(|&brand| FilterOption::new(brand, brand, &brand_filter))
            .collect(),
        sort,
        brand: brand_filter,
    }
}

/// Search results.
#[instrument(skip(state, session, user, nonce))]
pub async fn search(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let q = query.q.trim().to_string();
    let products = if q.is_empty() {
        Vec::new()
    } else {
        match state.backend().search_products(&q).await {
            Ok(products) => product_cards(&products),
            Err(e) => {
                tracing::warn!(error = %e, "Product search failed");
                Vec::new()
            }
        }
    };

    SearchTemplate {
        page: PageContext::load(&session, user.as_ref(), nonce, format!("Tìm kiếm: {q}")).await,
        query: q,
        products,
    }
}

/// Product detail page.
///
/// Product, color variants, related products and comments load in
/// parallel; only a missing product fails the page.
#[instrument(skip(state, session, user, nonce), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = ProductId::new(id);
    let backend = state.backend();

    let (product, colors, related, comments) = tokio::join!(
        backend.get_product(&id),
        backend.color_variants(&id),
        backend.related_products(&id),
        backend.list_comments(&id),
    );

    let product = product?;
    let colors = colors.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load color variants");
        Vec::new()
    });
    let related = related.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load related products");
        Vec::new()
    });
    let comments = comments.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load comments");
        Vec::new()
    });

    let first_variant = product.variants.first().map(|v| v.id.clone());
    let first_color = colors.first().map(|c| c.color.clone());
    let price = selection_price(
        &product,
        first_variant.as_ref(),
        first_color.as_deref(),
        &colors,
    );

    add_breadcrumb("catalog", "Viewed product", Some(&[("product_id", id.as_str())]));

    Ok(ProductShowTemplate {
        page: PageContext::load(&session, user.as_ref(), nonce, product.name.clone()).await,
        product: ProductDetailView::new(&product, &colors),
        price: price.into(),
        related: related
            .iter()
            .filter(|p| p.id != product.id)
            .take(4)
            .map(ProductCardView::from)
            .collect(),
        comments: comments.iter().map(CommentView::from).collect(),
        logged_in: user.is_some(),
    })
}

/// Price fragment for the picked variant and color (HTMX).
#[instrument(skip(state), fields(product_id = %id))]
pub async fn price(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PriceQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = ProductId::new(id);
    let backend = state.backend();
    let (product, colors) = tokio::join!(backend.get_product(&id), backend.color_variants(&id));

    let product = product?;
    let colors = colors.unwrap_or_default();
    let variant = query
        .variant
        .filter(|v| !v.is_empty())
        .map(VariantId::new);

    let price = selection_price(
        &product,
        variant.as_ref(),
        query.color.as_deref().filter(|c| !c.is_empty()),
        &colors,
    );

    Ok(PriceTemplate {
        price: price.into(),
    })
}

/// Add a comment to a product.
#[instrument(skip(state, session, user, form), fields(product_id = %id))]
pub async fn add_comment(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    let id = ProductId::new(id);
    let back = format!("/products/{id}#comments");

    let comment = match form.validate() {
        Ok(comment) => comment,
        Err(errors) => {
            let message = errors.iter().map(|(_, m)| m).collect::<Vec<_>>().join(". ");
            set_flash(&session, Flash::error(message)).await;
            return Ok(Redirect::to(&back).into_response());
        }
    };

    let flash = match state.backend().create_comment(&user.token, &id, &comment).await {
        Ok(_) => Flash::success("Cảm ơn bạn đã đánh giá sản phẩm"),
        Err(e) => {
            let Some(message) = e.user_message().map(str::to_owned) else {
                return Err(e.into());
            };
            Flash::error(message)
        }
    };
    set_flash(&session, flash).await;

    Ok(Redirect::to(&back).into_response())
}

/// Reply to a comment.
#[instrument(skip(state, session, user, form), fields(comment_id = %id))]
pub async fn add_reply(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Form(form): Form<ReplyForm>,
) -> Result<Response, AppError> {
    let product_id = ProductId::new(form.product_id.trim());
    let back = format!("/products/{product_id}#comments");
    let content = form.content.trim();

    if content.is_empty() {
        set_flash(&session, Flash::error("Vui lòng nhập nội dung trả lời")).await;
        return Ok(Redirect::to(&back).into_response());
    }

    state
        .backend()
        .create_reply(&user.token, &CommentId::new(id), content)
        .await?;

    Ok(Redirect::to(&back).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product() -> Product {
        serde_json::from_value(serde_json::json!({
            "_id": "p1",
            "name": "Galaxy S24",
            "price": 20000000,
            "discount": 0,
            "variants": [
                { "_id": "v-new", "storage": "256GB", "condition": "new", "price": 22000000, "stock": 2 },
                { "_id": "v-used", "storage": "128GB", "condition": "used", "stock": 1 }
            ]
        }))
        .unwrap()
    }

    fn colors() -> Vec<ColorVariant> {
        serde_json::from_value(serde_json::json!([
            { "_id": "c1", "color": "Đen", "stock": 3 },
            { "_id": "c2", "color": "Titan", "stock": 1, "priceAdjustment": 500000 }
        ]))
        .unwrap()
    }

    #[test]
    fn test_variant_price_plus_color_adjustment() {
        let price = selection_price(
            &product(),
            Some(&VariantId::new("v-new")),
            Some("Titan"),
            &colors(),
        );
        assert_eq!(price.final_price.dong(), 22_500_000);
        assert!(!price.has_saving());
    }

    #[test]
    fn test_used_variant_without_price_gets_condition_reduction() {
        let price = selection_price(&product(), Some(&VariantId::new("v-used")), None, &colors());
        assert_eq!(price.original.dong(), 20_000_000);
        assert_eq!(price.final_price.dong(), 16_000_000);
        assert_eq!(price.saved_percent, 20);
    }

    #[test]
    fn test_unknown_selection_uses_base_price() {
        let price = selection_price(&product(), Some(&VariantId::new("nope")), Some("Hồng"), &[]);
        assert_eq!(price.final_price.dong(), 20_000_000);
    }

    #[test]
    fn test_listing_query_drops_unknown_sort() {
        let query = ListingQuery {
            sort: Some("drop table".to_string()),
            page: Some(0),
            ..ListingQuery::default()
        };
        let backend = query.to_backend();
        assert_eq!(backend.sort, None);
        assert_eq!(backend.page, Some(1));
        assert_eq!(backend.limit, Some(PAGE_SIZE));
    }

    #[test]
    fn test_page_url_keeps_filters() {
        let query = ListingQuery {
            brand: Some("Apple".to_string()),
            min_price: Some(5_000_000),
            ..ListingQuery::default()
        };
        assert_eq!(query.page_url(2), "/products?page=2&brand=Apple&min_price=5000000");
    }

    #[test]
    fn test_listing_query_accepts_blank_prices() {
        let uri = "/products?sort=price&brand=Apple&min_price=&max_price="
            .parse()
            .unwrap();
        let Query(query) = Query::<ListingQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.page, None);
        assert_eq!(query.min_price, None);
        assert_eq!(query.max_price, None);
        assert_eq!(query.sort.as_deref(), Some("price"));
        assert_eq!(query.brand.as_deref(), Some("Apple"));
        assert_eq!(query.page_url(2), "/products?page=2&sort=price&brand=Apple");
    }

    #[test]
    fn test_listing_query_rejects_non_numeric_price() {
        let uri = "/products?min_price=abc".parse().unwrap();
        assert!(Query::<ListingQuery>::try_from_uri(&uri).is_err());
    }
}
