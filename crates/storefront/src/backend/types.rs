//! Transport records for the commerce backend REST API.
//!
//! The backend speaks camelCase JSON with Mongo-style `_id` identifiers.
//! Everything here is deserialized as-is; the only derived values are the
//! price helpers in [`mobistore_core::pricing`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use mobistore_core::pricing::CartLinePrice;
use mobistore_core::{
    AddressId, CartItemId, ColorVariantId, CommentId, DeviceCondition, FinanceStatus, Money,
    NewsId, OrderId, OrderStatus, PaymentMethod, ProductId, ReplyId, UserId, UserRole, VariantId,
};

// =============================================================================
// Users
// =============================================================================

/// A storefront account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub avatar: Option<String>,
}

/// Successful login or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Credentials for `POST /users/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Payload for `POST /users/register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

// =============================================================================
// Products
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "name_or_string")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "name_or_string")]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Money,
    /// Percentage discount, 0-100.
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub stock: u32,
    pub rating: Option<f32>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    /// First image, if any.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Find a variant by id.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| &v.id == id)
    }
}

/// A SKU configuration of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(rename = "_id")]
    pub id: VariantId,
    pub color: Option<String>,
    pub storage: Option<String>,
    pub ram: Option<String>,
    #[serde(default)]
    pub condition: DeviceCondition,
    pub price: Option<Money>,
    #[serde(default)]
    pub stock: u32,
    pub sku: Option<String>,
}

impl Variant {
    /// Human-readable summary, e.g. `256GB · 8GB RAM · Like new 99%`.
    #[must_use]
    pub fn title(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(storage) = &self.storage {
            parts.push(storage.clone());
        }
        if let Some(ram) = &self.ram {
            parts.push(format!("{ram} RAM"));
        }
        if let Some(color) = &self.color {
            parts.push(color.clone());
        }
        parts.push(self.condition.label().to_string());
        parts.join(" · ")
    }
}

/// Per-color stock/image record from `/products/{id}/color-variants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorVariant {
    #[serde(rename = "_id")]
    pub id: ColorVariantId,
    pub color: String,
    pub color_code: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    pub sku: Option<String>,
    /// Added to the variant or base price.
    pub price_adjustment: Option<Money>,
}

/// Filters for `GET /products`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u64>,
}

impl ProductQuery {
    /// Stable cache key for this filter combination.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "products:{}:{}:{}:{}:{}:{}",
            self.page.unwrap_or(1),
            self.limit.unwrap_or(0),
            self.sort.as_deref().unwrap_or_default(),
            self.brand.as_deref().unwrap_or_default(),
            self.min_price.unwrap_or(0),
            self.max_price.unwrap_or(0),
        )
    }
}

/// One page of products.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
}

/// `GET /products` answers either with a bare array or a paged object.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum ProductListResponse {
    Paged {
        products: Vec<Product>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        page: Option<u32>,
        #[serde(default, alias = "totalPages")]
        pages: Option<u32>,
    },
    Bare(Vec<Product>),
}

impl From<ProductListResponse> for ProductPage {
    fn from(response: ProductListResponse) -> Self {
        match response {
            ProductListResponse::Paged {
                products,
                total,
                page,
                pages,
            } => {
                let total = total.unwrap_or(products.len() as u64);
                Self {
                    products,
                    total,
                    page: page.unwrap_or(1),
                    pages: pages.unwrap_or(1).max(1),
                }
            }
            ProductListResponse::Bare(products) => Self {
                total: products.len() as u64,
                products,
                page: 1,
                pages: 1,
            },
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A cart line's product: populated record or bare id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Populated(Box<Product>),
    Id(ProductId),
}

impl ProductRef {
    #[must_use]
    pub fn id(&self) -> &ProductId {
        match self {
            Self::Populated(product) => &product.id,
            Self::Id(id) => id,
        }
    }

    #[must_use]
    pub fn product(&self) -> Option<&Product> {
        match self {
            Self::Populated(product) => Some(product),
            Self::Id(_) => None,
        }
    }
}

/// A line in the shopper's cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "_id")]
    pub id: CartItemId,
    #[serde(rename = "productId")]
    pub product: ProductRef,
    pub variant: Option<Variant>,
    #[serde(default = "one")]
    pub quantity: u32,
    pub price: Option<Money>,
    pub color: Option<String>,
}

const fn one() -> u32 {
    1
}

impl CartLinePrice for CartItem {
    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn variant_price(&self) -> Option<Money> {
        self.variant.as_ref().and_then(|v| v.price)
    }

    fn line_price(&self) -> Option<Money> {
        self.price
    }

    fn product_price(&self) -> Option<Money> {
        self.product.product().map(|p| p.price)
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

/// Payload for `POST /cart`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub quantity: u32,
}

// =============================================================================
// Addresses
// =============================================================================

/// An address book entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "_id")]
    pub id: AddressId,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub city: Option<String>,
    pub district: Option<String>,
    pub ward: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// Street, ward, district, city joined with commas.
    #[must_use]
    pub fn one_line(&self) -> String {
        join_address(
            &self.address,
            [&self.ward, &self.district, &self.city],
        )
    }

    /// Copy of this entry as an order's shipping address.
    #[must_use]
    pub fn to_shipping(&self) -> ShippingAddress {
        ShippingAddress {
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            district: self.district.clone(),
            ward: self.ward.clone(),
        }
    }
}

/// Address snapshot stored on an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
}

impl ShippingAddress {
    #[must_use]
    pub fn one_line(&self) -> String {
        join_address(
            &self.address,
            [&self.ward, &self.district, &self.city],
        )
    }
}

fn join_address(street: &str, rest: [&Option<String>; 3]) -> String {
    std::iter::once(street)
        .chain(rest.into_iter().filter_map(Option::as_deref))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Orders
// =============================================================================

/// A line on a placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(rename = "productId")]
    pub product: Option<ProductRef>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub variant: Option<Variant>,
    pub color: Option<String>,
    #[serde(default = "one")]
    pub quantity: u32,
    pub price: Option<Money>,
}

impl OrderItem {
    /// Name recorded on the line, else the populated product's name.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| {
                self.product
                    .as_ref()
                    .and_then(ProductRef::product)
                    .map(|p| p.name.clone())
            })
            .unwrap_or_default()
    }
}

impl CartLinePrice for OrderItem {
    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn variant_price(&self) -> Option<Money> {
        self.variant.as_ref().and_then(|v| v.price)
    }

    fn line_price(&self) -> Option<Money> {
        self.price
    }

    fn product_price(&self) -> Option<Money> {
        self.product
            .as_ref()
            .and_then(ProductRef::product)
            .map(|p| p.price)
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub order_code: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub total_amount: Money,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub is_installment: bool,
    pub finance_status: Option<FinanceStatus>,
    pub installment_months: Option<u32>,
    pub down_payment_percent: Option<u32>,
    pub shipping_address: Option<ShippingAddress>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Code shown to the customer: the order code, else the id's tail.
    #[must_use]
    pub fn reference(&self) -> String {
        self.order_code
            .clone()
            .filter(|code| !code.trim().is_empty())
            .unwrap_or_else(|| self.id.short().to_uppercase())
    }
}

/// Payload for `POST /orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub total_amount: Money,
    pub is_installment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment_months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_payment_percent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// =============================================================================
// Comments
// =============================================================================

/// Name of the person who wrote a comment or reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: String,
}

/// A product comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: CommentId,
    #[serde(default)]
    pub user: Option<Author>,
    #[serde(default)]
    pub content: String,
    pub rating: Option<u8>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

/// A reply to a comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(rename = "_id")]
    pub id: ReplyId,
    #[serde(default)]
    pub user: Option<Author>,
    #[serde(default)]
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// News
// =============================================================================

/// A news article.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct News {
    #[serde(rename = "_id")]
    pub id: NewsId,
    #[serde(default)]
    pub title: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub content: String,
    pub image: Option<String>,
    #[serde(default = "default_published")]
    pub published: bool,
    pub created_at: Option<DateTime<Utc>>,
}

const fn default_published() -> bool {
    true
}

// =============================================================================
// Chat
// =============================================================================

/// A button suggested by the intent router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAction {
    pub label: String,
    pub url: String,
}

/// Answer from `POST /chat/ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub actions: Vec<ChatAction>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Accept either `"Apple"` or a populated `{ "name": "Apple", ... }`.
fn name_or_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Name(String),
        Object { name: String },
        Other(serde_json::Value),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Name(name) | Raw::Object { name }) => Some(name),
        Some(Raw::Other(_)) | None => None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mobistore_core::pricing::{cart_subtotal, unit_price};

    #[test]
    fn test_product_tolerates_sparse_records() {
        let product: Product = serde_json::from_str(
            r#"{"_id":"p1","name":"iPhone 15","price":"21990000","brand":{"_id":"b1","name":"Apple"}}"#,
        )
        .unwrap();
        assert_eq!(product.price.dong(), 21_990_000);
        assert_eq!(product.brand.as_deref(), Some("Apple"));
        assert!(product.variants.is_empty());
        assert_eq!(product.discount, Decimal::ZERO);
    }

    #[test]
    fn test_cart_item_with_bare_product_id() {
        let item: CartItem = serde_json::from_str(
            r#"{"_id":"c1","productId":"p1","quantity":2,"price":1500000}"#,
        )
        .unwrap();
        assert_eq!(item.product.id().as_str(), "p1");
        assert_eq!(unit_price(&item).dong(), 1_500_000);
    }

    #[test]
    fn test_cart_item_price_from_populated_variant() {
        let cart: Cart = serde_json::from_str(
            r#"{"items":[
                {"_id":"c1","productId":{"_id":"p1","name":"A","price":100},
                 "variant":{"_id":"v1","condition":"used","price":80},"quantity":3},
                {"_id":"c2","productId":{"_id":"p2","name":"B","price":50},"quantity":1}
            ]}"#,
        )
        .unwrap();
        assert_eq!(cart_subtotal(&cart.items).dong(), 290);
    }

    #[test]
    fn test_product_list_bare_and_paged() {
        let bare: ProductListResponse =
            serde_json::from_str(r#"[{"_id":"p1","name":"A"}]"#).unwrap();
        let page = ProductPage::from(bare);
        assert_eq!(page.total, 1);
        assert_eq!(page.pages, 1);

        let paged: ProductListResponse = serde_json::from_str(
            r#"{"products":[{"_id":"p1","name":"A"}],"total":40,"page":2,"totalPages":4}"#,
        )
        .unwrap();
        let page = ProductPage::from(paged);
        assert_eq!(page.total, 40);
        assert_eq!(page.page, 2);
        assert_eq!(page.pages, 4);
    }

    #[test]
    fn test_address_one_line_skips_empty_parts() {
        let address: Address = serde_json::from_str(
            r#"{"_id":"a1","fullName":"Lan","phone":"0912345678","address":"12 Lê Lợi","ward":"","city":"Huế"}"#,
        )
        .unwrap();
        assert_eq!(address.one_line(), "12 Lê Lợi, Huế");
    }

    #[test]
    fn test_order_reference_falls_back_to_id() {
        let order: Order =
            serde_json::from_str(r#"{"_id":"65f0c2a9b1d4e3f2a1b0c9d8","status":"shipping"}"#)
                .unwrap();
        assert_eq!(order.reference(), "A1B0C9D8");
        assert_eq!(order.status, OrderStatus::Shipping);
    }

    #[test]
    fn test_variant_title() {
        let variant: Variant = serde_json::from_str(
            r#"{"_id":"v1","storage":"256GB","ram":"8GB","condition":"like_new"}"#,
        )
        .unwrap();
        assert_eq!(variant.title(), "256GB · 8GB RAM · Like new 99%");
    }
}
