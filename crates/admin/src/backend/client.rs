//! `AdminBackendClient` implementation.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use mobistore_core::validation::ValidatedNews;
use mobistore_core::transport::{decode_body, encode_segment, error_message, excerpt};
use mobistore_core::{FinanceStatus, NewsId, OrderId, OrderStatus};

use super::BackendError;
use super::types::{
    AuthResponse, CustomerGrowthPoint, DashboardSummary, FinanceUpdate, Growth, LoginRequest,
    News, Order, RevenuePoint, StatusCount, StatusUpdate, TopProduct, User,
};
use crate::config::BackendConfig;

/// Client for the admin side of the commerce backend.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct AdminBackendClient {
    inner: Arc<AdminBackendClientInner>,
}

struct AdminBackendClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl AdminBackendClient {
    /// Create a new admin backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("mobistore-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminBackendClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

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
            tracing::error!(error = %e, body = %excerpt(&body), "Failed to parse backend response");
            BackendError::from(e)
        })
    }

    async fn execute_unit(&self, request: RequestBuilder) -> Result<(), BackendError> {
        self.execute::<Value>(request).await.map(|_| ())
    }

    /// Check the backend is reachable.
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
    // Account
    // =========================================================================

    /// Log in with email and password. The caller checks the role.
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

    /// The logged-in account.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected.
    #[instrument(skip_all)]
    pub async fn me(&self, token: &str) -> Result<User, BackendError> {
        self.execute(self.request(Method::GET, "/users/profile", Some(token)))
            .await
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    /// Headline counters for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn dashboard_summary(&self, token: &str) -> Result<DashboardSummary, BackendError> {
        self.execute(self.request(Method::GET, "/dashboard/summary", Some(token)))
            .await
    }

    /// Revenue and order count per month of `year`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn revenue_by_month(
        &self,
        token: &str,
        year: i32,
    ) -> Result<Vec<RevenuePoint>, BackendError> {
        let request = self
            .request(Method::GET, "/analytics/revenue", Some(token))
            .query(&[("year", year)]);
        self.execute(request).await
    }

    /// Number of orders per status.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn order_status_breakdown(
        &self,
        token: &str,
    ) -> Result<Vec<StatusCount>, BackendError> {
        self.execute(self.request(Method::GET, "/analytics/order-status", Some(token)))
            .await
    }

    /// Best sellers by units sold.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn top_products(
        &self,
        token: &str,
        limit: u32,
    ) -> Result<Vec<TopProduct>, BackendError> {
        let request = self
            .request(Method::GET, "/analytics/top-products", Some(token))
            .query(&[("limit", limit)]);
        self.execute(request).await
    }

    /// New customers per month.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn customer_growth(
        &self,
        token: &str,
    ) -> Result<Vec<CustomerGrowthPoint>, BackendError> {
        self.execute(self.request(Method::GET, "/analytics/customer-growth", Some(token)))
            .await
    }

    /// Month-over-month growth as computed by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; callers fall back to
    /// [`crate::statistics::month_over_month`].
    #[instrument(skip_all)]
    pub async fn growth(&self, token: &str) -> Result<Growth, BackendError> {
        self.execute(self.request(Method::GET, "/analytics/growth", Some(token)))
            .await
    }

    /// Every order, all customers.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn all_orders(&self, token: &str) -> Result<Vec<Order>, BackendError> {
        self.execute(self.request(Method::GET, "/orders/admin/all", Some(token)))
            .await
    }

    /// Every account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn all_customers(&self, token: &str) -> Result<Vec<User>, BackendError> {
        self.execute(self.request(Method::GET, "/users/admin/all", Some(token)))
            .await
    }

    // =========================================================================
    // News
    // =========================================================================

    /// All articles, drafts included.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn list_news(&self, token: &str) -> Result<Vec<News>, BackendError> {
        self.execute(self.request(Method::GET, "/news", Some(token)))
            .await
    }

    /// A single article.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the article does not exist.
    #[instrument(skip(self, token), fields(news_id = %id))]
    pub async fn get_news(&self, token: &str, id: &NewsId) -> Result<News, BackendError> {
        let path = format!("/news/{}", encode_segment(id.as_str()));
        self.execute(self.request(Method::GET, &path, Some(token)))
            .await
    }

    /// Publish a new article.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the article.
    #[instrument(skip(self, token, news), fields(title = %news.title))]
    pub async fn create_news(
        &self,
        token: &str,
        news: &ValidatedNews,
    ) -> Result<News, BackendError> {
        let request = self.request(Method::POST, "/news", Some(token)).json(news);
        self.execute(request).await
    }

    /// Replace an article.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, news), fields(news_id = %id))]
    pub async fn update_news(
        &self,
        token: &str,
        id: &NewsId,
        news: &ValidatedNews,
    ) -> Result<News, BackendError> {
        let path = format!("/news/{}", encode_segment(id.as_str()));
        let request = self.request(Method::PUT, &path, Some(token)).json(news);
        self.execute(request).await
    }

    /// Delete an article.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(news_id = %id))]
    pub async fn delete_news(&self, token: &str, id: &NewsId) -> Result<(), BackendError> {
        let path = format!("/news/{}", encode_segment(id.as_str()));
        self.execute_unit(self.request(Method::DELETE, &path, Some(token)))
            .await
    }

    // =========================================================================
    // Order updates
    // =========================================================================

    /// Orders, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn admin_orders(
        &self,
        token: &str,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, BackendError> {
        let mut request = self.request(Method::GET, "/orders/admin", Some(token));
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        self.execute(request).await
    }

    /// Move an order to `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the transition.
    #[instrument(skip(self, token), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        token: &str,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, BackendError> {
        let path = format!("/orders/admin/{}/status", encode_segment(id.as_str()));
        let request = self
            .request(Method::PUT, &path, Some(token))
            .json(&StatusUpdate { status });
        self.execute(request).await
    }

    /// Installment orders, optionally only those in `finance`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn installment_orders(
        &self,
        token: &str,
        finance: Option<FinanceStatus>,
    ) -> Result<Vec<Order>, BackendError> {
        let mut request = self.request(Method::GET, "/orders/admin/installments", Some(token));
        if let Some(finance) = finance {
            request = request.query(&[("financeStatus", finance.as_str())]);
        }
        self.execute(request).await
    }

    /// Approve or reject an installment application.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the decision.
    #[instrument(skip(self, token), fields(order_id = %id, finance_status = %finance_status))]
    pub async fn update_finance_status(
        &self,
        token: &str,
        id: &OrderId,
        finance_status: FinanceStatus,
    ) -> Result<Order, BackendError> {
        let path = format!("/orders/admin/{}/finance", encode_segment(id.as_str()));
        let request = self
            .request(Method::PUT, &path, Some(token))
            .json(&FinanceUpdate { finance_status });
        self.execute(request).await
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn status_error(status: StatusCode, body: &str) -> BackendError {
    let message = error_message(body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    match status {
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized,
        StatusCode::FORBIDDEN => BackendError::Forbidden,
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        _ => BackendError::Status {
            status: status.as_u16(),
            message,
        },
    }
}
