//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page
//!
//! # Catalog
//! GET  /products                      - Listing (page, sort, brand, price range)
//! GET  /products/search?q=            - Search results
//! GET  /products/{id}                 - Detail
//! GET  /products/{id}/price           - Price fragment for a selection (HTMX)
//! POST /products/{id}/comments        - Add comment
//! POST /comments/{id}/replies         - Add reply
//!
//! # Cart (HTMX fragments)
//! GET  /cart                          - Cart page
//! POST /cart/add                      - Add item (returns count badge)
//! POST /cart/update                   - Update quantity (returns items fragment)
//! POST /cart/remove                   - Remove line (returns items fragment)
//! GET  /cart/count                    - Count badge
//!
//! # Checkout
//! GET  /checkout                      - Checkout form
//! POST /checkout                      - Place order
//! GET  /payment/{order}               - Transfer QR and countdown
//! POST /payment/{order}/acknowledge   - "I have paid"
//!
//! # Account (requires auth)
//! GET  /account                       - Profile
//! POST /account                       - Update profile
//! GET  /account/addresses             - Address book
//! POST /account/addresses             - Create address
//! POST /account/addresses/{id}        - Update address
//! POST /account/addresses/{id}/delete - Delete address
//! POST /account/addresses/{id}/default - Make default
//! GET  /account/orders                - Order history
//! GET  /account/orders/{id}           - Order detail
//! POST /account/orders/{id}/cancel    - Cancel pending order
//! GET  /account/installments          - Installment applications
//!
//! # News
//! GET  /news, /news/{id}
//!
//! # Auth
//! GET/POST /auth/login, /auth/register; POST /auth/logout
//!
//! # Chat API (JSON)
//! POST /api/chat/ask                  - Backend intent router
//! POST /api/chat/assistant            - Keyword / Gemini assistant
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod news;
pub mod orders;
pub mod products;
pub mod views;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::middleware::{auth_rate_limiter, chat_rate_limiter};
use crate::models::{CurrentUser, Flash, keys};
use crate::state::AppState;

// =============================================================================
// Page Context
// =============================================================================

/// Data every full page needs for its layout.
#[derive(Clone, Default)]
pub struct PageContext {
    pub title: String,
    pub nonce: String,
    pub user_name: Option<String>,
    pub flash: Option<Flash>,
}

impl PageContext {
    /// Build the layout context, consuming any pending flash message.
    pub async fn load(
        session: &Session,
        user: Option<&CurrentUser>,
        nonce: String,
        title: impl Into<String>,
    ) -> Self {
        let flash = session.remove::<Flash>(keys::FLASH).await.ok().flatten();
        Self {
            title: title.into(),
            nonce,
            user_name: user.map(|u| u.display_name().to_string()),
            flash,
        }
    }
}

/// Queue a flash message for the next page.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

// =============================================================================
// Routers
// =============================================================================

/// Catalog routes.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/search", get(products::search))
        .route("/{id}", get(products::show))
        .route("/{id}/price", get(products::price))
        .route("/{id}/comments", post(products::add_comment))
}

/// Cart routes.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Account routes.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::profile).post(account::update_profile))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/{id}", post(account::update_address))
        .route("/addresses/{id}/delete", post(account::delete_address))
        .route("/addresses/{id}/default", post(account::set_default_address))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/cancel", post(orders::cancel))
        .route("/installments", get(orders::installments))
}

/// Auth routes, rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Chat API routes, rate limited.
pub fn chat_api_routes() -> Router<AppState> {
    Router::new()
        .route("/ask", post(api::chat::ask))
        .route("/assistant", post(api::chat::assistant))
        .layer(chat_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .route("/comments/{id}/replies", post(products::add_reply))
        .nest("/cart", cart_routes())
        .route(
            "/checkout",
            get(checkout::checkout_page).post(checkout::place_order),
        )
        .route("/payment/{id}", get(checkout::payment_page))
        .route("/payment/{id}/acknowledge", post(checkout::acknowledge))
        .nest("/account", account_routes())
        .route("/news", get(news::index))
        .route("/news/{id}", get(news::show))
        .nest("/auth", auth_routes())
        .nest("/api/chat", chat_api_routes())
}
