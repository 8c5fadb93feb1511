//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                  - Dashboard (summary cards + growth)
//! GET  /statistics?year=                  - Charts
//!
//! # News
//! GET  /news                              - All articles, drafts included
//! GET  /news/new, POST /news              - Create
//! GET  /news/{id}/edit, POST /news/{id}   - Update
//! POST /news/{id}/delete                  - Delete
//!
//! # Updates
//! GET  /updates?status=                   - Orders by status
//! POST /updates/orders/{id}/status        - Move an order along its lifecycle
//! GET  /updates/installments?financeStatus= - Installment applications
//! POST /updates/installments/{id}         - Approve or reject
//!
//! # Auth
//! GET/POST /auth/login, POST /auth/logout
//! ```

pub mod auth;
pub mod dashboard;
pub mod news;
pub mod statistics;
pub mod updates;
pub mod views;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::middleware::login_rate_limiter;
use crate::models::{CurrentAdmin, Flash, keys};
use crate::state::AppState;

/// Data every full page needs for its layout.
#[derive(Clone, Default)]
pub struct PageContext {
    pub title: String,
    /// Path of the active sidebar entry.
    pub current_path: &'static str,
    pub admin_name: String,
    pub flash: Option<Flash>,
}

impl PageContext {
    /// Build the layout context, consuming any pending flash message.
    pub async fn load(
        session: &Session,
        admin: &CurrentAdmin,
        current_path: &'static str,
        title: impl Into<String>,
    ) -> Self {
        let flash = session.remove::<Flash>(keys::FLASH).await.ok().flatten();
        Self {
            title: title.into(),
            current_path,
            admin_name: admin.display_name().to_string(),
            flash,
        }
    }

    /// Whether `path` is the active sidebar entry.
    #[must_use]
    pub fn is_active(&self, path: &str) -> bool {
        self.current_path == path
    }
}

/// Queue a flash message for the next page.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// News routes.
pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(news::index).post(news::create))
        .route("/new", get(news::new_page))
        .route("/{id}", post(news::update))
        .route("/{id}/edit", get(news::edit_page))
        .route("/{id}/delete", post(news::delete))
}

/// Order and installment updates.
pub fn update_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(updates::orders))
        .route("/orders/{id}/status", post(updates::update_status))
        .route("/installments", get(updates::installments))
        .route("/installments/{id}", post(updates::review_installment))
}

/// Auth routes, rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .layer(login_rate_limiter())
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/statistics", get(statistics::statistics))
        .nest("/news", news_routes())
        .nest("/updates", update_routes())
        .nest("/auth", auth_routes())
}
