//! `BackendClient` implementation.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use mobistore_core::validation::{ValidatedAddress, ValidatedComment, ValidatedProfile};
use mobistore_core::transport::{decode_body, encode_segment, error_message, excerpt};
use mobistore_core::{AddressId, CartItemId, CommentId, NewsId, OrderId, ProductId};

use super::BackendError;
use super::cache::{CacheValue, color_variants_key, product_key, related_key};
use super::types::{
    AddToCartRequest, Address, AuthResponse, Cart, ChatReply, ColorVariant, Comment,
    CreateOrderRequest, LoginRequest, News, Order, Product, ProductListResponse, ProductPage,
    ProductQuery, RegisterRequest, Reply, User,
};
use crate::config::BackendConfig;

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the commerce backend REST API.
///
/// Cheap to clone; all clones share one connection pool and one cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("mobistore-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// Start a request to `path` (relative to the base URL).
    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode the (possibly enveloped) JSON response.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = status_error(status, &body);
            if status.is_server_error() {
                tracing::error!(status = %status, body = %excerpt(&body), "Backend returned server error");
            } else {
                debug!(status = %status, error = %err, "Backend rejected request");
            }
            return Err(err);
        }

        decode_body(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                "Failed to parse backend response"
            );
            BackendError::from(e)
        })
    }

    /// Send a request whose response body is irrelevant.
    async fn execute_unit(&self, request: RequestBuilder) -> Result<(), BackendError> {
        self.execute::<Value>(request).await.map(|_| ())
    }

    /// Check the backend answers a cheap uncached read.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or failing.
    pub async fn ping(&self) -> Result<(), BackendError> {
        let request = self
            .request(Method::GET, "/products", None)
            .query(&[("limit", "1")]);
        self.execute_unit(request).await
    }

    // =========================================================================
    // Account Methods
    // =========================================================================

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` for wrong credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, BackendError> {
        let request = self
            .request(Method::POST, "/users/login", None)
            .json(&LoginRequest { email, password });
        self.execute(request).await
    }

    /// Create an account; the backend logs the new user in.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Status` (e.g. 400/409) when the email is taken.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, BackendError> {
        let request = self
            .request(Method::POST, "/users/register", None)
            .json(&RegisterRequest {
                name,
                email,
                password,
            });
        self.execute(request).await
    }

    /// Fetch the logged-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the request fails.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &str) -> Result<User, BackendError> {
        self.execute(self.request(Method::GET, "/users/profile", Some(token)))
            .await
    }

    /// Update the logged-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, profile))]
    pub async fn update_profile(
        &self,
        token: &str,
        profile: &ValidatedProfile,
    ) -> Result<User, BackendError> {
        let request = self
            .request(Method::PUT, "/users/profile", Some(token))
            .json(profile);
        self.execute(request).await
    }

    // =========================================================================
    // Catalog Methods (cached)
    // =========================================================================

    /// List products with filters and pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, BackendError> {
        let cache_key = query.cache_key();
        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product list");
            return Ok(page);
        }

        let request = self.request(Method::GET, "/products", None).query(query);
        let page = ProductPage::from(self.execute::<ProductListResponse>(request).await?);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;
        Ok(page)
    }

    /// Full-text product search. Not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, q: &str) -> Result<Vec<Product>, BackendError> {
        let request = self
            .request(Method::GET, "/products/search", None)
            .query(&[("q", q)]);
        let page = ProductPage::from(self.execute::<ProductListResponse>(request).await?);
        Ok(page.products)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let cache_key = product_key(id.as_str());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let path = format!("/products/{}", encode_segment(id.as_str()));
        let product: Product = self.execute(self.request(Method::GET, &path, None)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Per-color records for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn color_variants(&self, id: &ProductId) -> Result<Vec<ColorVariant>, BackendError> {
        let cache_key = color_variants_key(id.as_str());
        if let Some(CacheValue::ColorVariants(variants)) = self.inner.cache.get(&cache_key).await {
            return Ok(variants);
        }

        let path = format!("/products/{}/color-variants", encode_segment(id.as_str()));
        let variants: Vec<ColorVariant> =
            self.execute(self.request(Method::GET, &path, None)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::ColorVariants(variants.clone()))
            .await;
        Ok(variants)
    }

    /// Products related to `id` (same brand or category).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn related_products(&self, id: &ProductId) -> Result<Vec<Product>, BackendError> {
        let cache_key = related_key(id.as_str());
        if let Some(CacheValue::Related(products)) = self.inner.cache.get(&cache_key).await {
            return Ok(products);
        }

        let path = format!("/products/{}/related", encode_segment(id.as_str()));
        let request = self.request(Method::GET, &path, None);
        let products = ProductPage::from(self.execute::<ProductListResponse>(request).await?).products;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Related(products.clone()))
            .await;
        Ok(products)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Get the logged-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &str) -> Result<Cart, BackendError> {
        self.execute(self.request(Method::GET, "/cart", Some(token)))
            .await
    }

    /// Add a line to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the item (e.g. out of stock).
    #[instrument(skip(self, token), fields(product_id = %item.product_id))]
    pub async fn add_to_cart(
        &self,
        token: &str,
        item: &AddToCartRequest,
    ) -> Result<Cart, BackendError> {
        let request = self.request(Method::POST, "/cart", Some(token)).json(item);
        self.execute(request).await
    }

    /// Change a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn update_cart_item(
        &self,
        token: &str,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<Cart, BackendError> {
        let path = format!("/cart/{}", encode_segment(item_id.as_str()));
        let request = self
            .request(Method::PUT, &path, Some(token))
            .json(&json!({ "quantity": quantity }));
        self.execute(request).await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn remove_cart_item(
        &self,
        token: &str,
        item_id: &CartItemId,
    ) -> Result<Cart, BackendError> {
        let path = format!("/cart/{}", encode_segment(item_id.as_str()));
        self.execute(self.request(Method::DELETE, &path, Some(token)))
            .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &str) -> Result<(), BackendError> {
        self.execute_unit(self.request(Method::DELETE, "/cart", Some(token)))
            .await
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Place an order from the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order.
    #[instrument(skip(self, token, order), fields(payment_method = %order.payment_method))]
    pub async fn create_order(
        &self,
        token: &str,
        order: &CreateOrderRequest,
    ) -> Result<Order, BackendError> {
        let request = self.request(Method::POST, "/orders", Some(token)).json(order);
        self.execute(request).await
    }

    /// The logged-in user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn my_orders(&self, token: &str) -> Result<Vec<Order>, BackendError> {
        self.execute(self.request(Method::GET, "/orders/my-orders", Some(token)))
            .await
    }

    /// Get one of the logged-in user's orders.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the order does not exist.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &str, id: &OrderId) -> Result<Order, BackendError> {
        let path = format!("/orders/{}", encode_segment(id.as_str()));
        self.execute(self.request(Method::GET, &path, Some(token)))
            .await
    }

    /// Cancel a pending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order can no longer be cancelled.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn cancel_order(&self, token: &str, id: &OrderId) -> Result<Order, BackendError> {
        let path = format!("/orders/{}/cancel", encode_segment(id.as_str()));
        self.execute(self.request(Method::PUT, &path, Some(token)))
            .await
    }

    /// The logged-in user's installment orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn installment_orders(&self, token: &str) -> Result<Vec<Order>, BackendError> {
        self.execute(self.request(Method::GET, "/orders/installments", Some(token)))
            .await
    }

    // =========================================================================
    // Address Methods
    // =========================================================================

    /// The logged-in user's address book.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn list_addresses(&self, token: &str) -> Result<Vec<Address>, BackendError> {
        self.execute(self.request(Method::GET, "/users/address", Some(token)))
            .await
    }

    /// Add an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the address.
    #[instrument(skip(self, token, address))]
    pub async fn create_address(
        &self,
        token: &str,
        address: &ValidatedAddress,
    ) -> Result<Address, BackendError> {
        let request = self
            .request(Method::POST, "/users/address", Some(token))
            .json(address);
        self.execute(request).await
    }

    /// Replace an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the address.
    #[instrument(skip(self, token, address))]
    pub async fn update_address(
        &self,
        token: &str,
        id: &AddressId,
        address: &ValidatedAddress,
    ) -> Result<Address, BackendError> {
        let path = format!("/users/address/{}", encode_segment(id.as_str()));
        let request = self.request(Method::PUT, &path, Some(token)).json(address);
        self.execute(request).await
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn delete_address(&self, token: &str, id: &AddressId) -> Result<(), BackendError> {
        let path = format!("/users/address/{}", encode_segment(id.as_str()));
        self.execute_unit(self.request(Method::DELETE, &path, Some(token)))
            .await
    }

    /// Make an address the default shipping address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn set_default_address(
        &self,
        token: &str,
        id: &AddressId,
    ) -> Result<(), BackendError> {
        let path = format!("/users/address/{}/default", encode_segment(id.as_str()));
        self.execute_unit(self.request(Method::PUT, &path, Some(token)))
            .await
    }

    // =========================================================================
    // Comment Methods
    // =========================================================================

    /// Comments on a product, with replies.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn list_comments(&self, product_id: &ProductId) -> Result<Vec<Comment>, BackendError> {
        let path = format!("/comments/{}", encode_segment(product_id.as_str()));
        self.execute(self.request(Method::GET, &path, None)).await
    }

    /// Comment on a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the comment.
    #[instrument(skip(self, token, comment), fields(product_id = %product_id))]
    pub async fn create_comment(
        &self,
        token: &str,
        product_id: &ProductId,
        comment: &ValidatedComment,
    ) -> Result<Comment, BackendError> {
        let path = format!("/comments/{}", encode_segment(product_id.as_str()));
        let request = self.request(Method::POST, &path, Some(token)).json(comment);
        self.execute(request).await
    }

    /// Reply to a comment.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the reply.
    #[instrument(skip(self, token, content))]
    pub async fn create_reply(
        &self,
        token: &str,
        comment_id: &CommentId,
        content: &str,
    ) -> Result<Reply, BackendError> {
        let path = format!("/replies/{}", encode_segment(comment_id.as_str()));
        let request = self
            .request(Method::POST, &path, Some(token))
            .json(&json!({ "content": content }));
        self.execute(request).await
    }

    // =========================================================================
    // News & Chat
    // =========================================================================

    /// Published news, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_news(&self) -> Result<Vec<News>, BackendError> {
        let news: Vec<News> = self.execute(self.request(Method::GET, "/news", None)).await?;
        Ok(news.into_iter().filter(|n| n.published).collect())
    }

    /// One news article.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the article does not exist.
    #[instrument(skip(self))]
    pub async fn get_news(&self, id: &NewsId) -> Result<News, BackendError> {
        let path = format!("/news/{}", encode_segment(id.as_str()));
        self.execute(self.request(Method::GET, &path, None)).await
    }

    /// Ask the backend intent router.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, message))]
    pub async fn chat_ask(
        &self,
        token: Option<&str>,
        message: &str,
    ) -> Result<ChatReply, BackendError> {
        let request = self
            .request(Method::POST, "/chat/ask", token)
            .json(&json!({ "message": message }));
        self.execute(request).await
    }
}

// =============================================================================
// Response Handling
// =============================================================================

/// Map a non-success status to a `BackendError`.
fn status_error(status: StatusCode, body: &str) -> BackendError {
    let message = error_message(body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    match status {
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized,
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        _ => BackendError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            BackendError::Unauthorized
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, r#"{"message":"Product not found"}"#),
            BackendError::NotFound(m) if m == "Product not found"
        ));
        match status_error(StatusCode::BAD_REQUEST, r#"{"error":"Hết hàng"}"#) {
            BackendError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Hết hàng");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_error_without_json_uses_reason() {
        match status_error(StatusCode::BAD_GATEWAY, "<html>") {
            BackendError::Status { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_user_message_only_for_client_errors() {
        let client = BackendError::Status {
            status: 409,
            message: "Email đã tồn tại".to_string(),
        };
        assert_eq!(client.user_message(), Some("Email đã tồn tại"));
        let server = BackendError::Status {
            status: 500,
            message: "stack trace".to_string(),
        };
        assert_eq!(server.user_message(), None);
    }
}
