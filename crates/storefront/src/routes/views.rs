//! Display types shared by several pages.
//!
//! Templates only see preformatted strings; money, dates and labels are
//! rendered here.

use chrono::{DateTime, FixedOffset, Utc};

use mobistore_core::pricing::{PriceSelection, cart_item_count, cart_subtotal, display_price, line_total, unit_price};
use mobistore_core::{Money, OrderStatus};

use crate::backend::{Cart, CartItem, Order, OrderItem, Product};

/// Vietnam is UTC+7 all year round.
const VN_OFFSET_SECS: i32 = 7 * 3600;

/// `dd/mm/yyyy HH:MM` in Vietnam time.
#[must_use]
pub fn format_datetime(at: Option<DateTime<Utc>>) -> String {
    let Some(at) = at else {
        return String::new();
    };
    match FixedOffset::east_opt(VN_OFFSET_SECS) {
        Some(offset) => at.with_timezone(&offset).format("%d/%m/%Y %H:%M").to_string(),
        None => at.format("%d/%m/%Y %H:%M").to_string(),
    }
}

/// `dd/mm/yyyy` in Vietnam time.
#[must_use]
pub fn format_date(at: Option<DateTime<Utc>>) -> String {
    format_datetime(at)
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Shorten text to `max` characters on a word boundary.
#[must_use]
pub fn shorten(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    let cut = cut.rsplit_once(' ').map_or(cut.as_str(), |(head, _)| head);
    format!("{}…", cut.trim_end())
}

// =============================================================================
// Products
// =============================================================================

/// Product tile on listings.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub image: Option<String>,
    pub price: String,
    pub original_price: Option<String>,
    pub saved_percent: u32,
    pub in_stock: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        let price = display_price(&PriceSelection {
            base_price: product.price,
            discount_percent: product.discount,
            ..PriceSelection::default()
        });
        let in_stock = product.stock > 0 || product.variants.iter().any(|v| v.stock > 0);

        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            brand: product.brand.clone().unwrap_or_default(),
            image: product.thumbnail().map(String::from),
            price: price.final_price.display(),
            original_price: price.has_saving().then(|| price.original.display()),
            saved_percent: price.saved_percent,
            in_stock,
        }
    }
}

/// Map a slice of products to cards.
#[must_use]
pub fn product_cards(products: &[Product]) -> Vec<ProductCardView> {
    products.iter().map(ProductCardView::from).collect()
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub variant_title: Option<String>,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        let product = item.product.product();
        let variant_title = item.variant.as_ref().map(|v| v.title()).or_else(|| item.color.clone());

        Self {
            id: item.id.to_string(),
            product_id: item.product.id().to_string(),
            name: product.map(|p| p.name.clone()).unwrap_or_default(),
            variant_title,
            image: product.and_then(Product::thumbnail).map(String::from),
            quantity: item.quantity,
            price: unit_price(item).display(),
            line_price: line_total(item).display(),
        }
    }
}

#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: Money::ZERO.display(),
            item_count: 0,
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items.iter().map(CartItemView::from).collect(),
            subtotal: cart_subtotal(&cart.items).display(),
            item_count: cart_item_count(&cart.items),
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Row in order history.
#[derive(Clone)]
pub struct OrderSummaryView {
    pub id: String,
    pub reference: String,
    pub created_at: String,
    pub total: String,
    pub status: String,
    pub status_class: &'static str,
    pub payment_method: &'static str,
    pub item_count: u32,
}

/// CSS modifier for a status badge.
#[must_use]
pub const fn status_class(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "badge-warning",
        OrderStatus::Confirmed => "badge-info",
        OrderStatus::Shipping => "badge-primary",
        OrderStatus::Delivered => "badge-success",
        OrderStatus::Cancelled => "badge-muted",
    }
}

impl From<&Order> for OrderSummaryView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            reference: order.reference(),
            created_at: format_datetime(order.created_at),
            total: order.total_amount.display(),
            status: order.status.label().to_string(),
            status_class: status_class(order.status),
            payment_method: order.payment_method.label(),
            item_count: cart_item_count(&order.items),
        }
    }
}

#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub variant_title: Option<String>,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        let image = item.image.clone().or_else(|| {
            item.product
                .as_ref()
                .and_then(|p| p.product())
                .and_then(Product::thumbnail)
                .map(String::from)
        });

        Self {
            name: item.display_name(),
            variant_title: item.variant.as_ref().map(|v| v.title()).or_else(|| item.color.clone()),
            image,
            quantity: item.quantity,
            price: unit_price(item).display(),
            line_price: line_total(item).display(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_datetime_uses_vietnam_time() {
        let at = DateTime::parse_from_rfc3339("2026-03-01T20:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_datetime(Some(at)), "02/03/2026 03:30");
        assert_eq!(format_date(Some(at)), "02/03/2026");
        assert_eq!(format_datetime(None), "");
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("  Tin mới  ", 20), "Tin mới");
        assert_eq!(shorten("Điện thoại giá rẻ tháng này", 14), "Điện thoại…");
    }

    #[test]
    fn test_product_card_shows_discount() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "_id": "p1",
            "name": "iPhone 15",
            "brand": { "name": "Apple" },
            "price": 20000000,
            "discount": 10,
            "stock": 3
        }))
        .unwrap();

        let card = ProductCardView::from(&product);
        assert_eq!(card.brand, "Apple");
        assert_eq!(card.price, "18.000.000 ₫");
        assert_eq!(card.original_price.as_deref(), Some("20.000.000 ₫"));
        assert_eq!(card.saved_percent, 10);
        assert!(card.in_stock);
    }

    #[test]
    fn test_cart_view_totals() {
        let cart: Cart = serde_json::from_value(serde_json::json!({
            "items": [
                { "_id": "i1", "productId": { "_id": "p1", "name": "A", "price": 1000000 }, "quantity": 2 },
                { "_id": "i2", "productId": "p2", "price": 500000, "quantity": 1 }
            ]
        }))
        .unwrap();

        let view = CartView::from(&cart);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, "2.500.000 ₫");
        assert_eq!(view.items[0].line_price, "2.000.000 ₫");
        assert_eq!(view.items[1].product_id, "p2");
    }
}
