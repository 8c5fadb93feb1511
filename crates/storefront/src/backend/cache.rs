//! Cache types for catalog reads.

use super::types::{ColorVariant, Product, ProductPage};

/// Cached value types.
///
/// Only catalog data is cached; carts, orders and account data always go
/// to the backend.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductPage),
    ColorVariants(Vec<ColorVariant>),
    Related(Vec<Product>),
}

/// Cache key for a single product.
pub fn product_key(id: &str) -> String {
    format!("product:{id}")
}

/// Cache key for a product's color variants.
pub fn color_variants_key(id: &str) -> String {
    format!("color-variants:{id}")
}

/// Cache key for a product's related products.
pub fn related_key(id: &str) -> String {
    format!("related:{id}")
}
