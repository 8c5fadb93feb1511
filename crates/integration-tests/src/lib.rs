//! Integration tests for Mobistore.
//!
//! The storefront and admin backend clients are exercised against a
//! [`wiremock`] server standing in for the commerce backend, so no running
//! services are needed:
//!
//! ```bash
//! cargo test -p mobistore-integration-tests
//! ```
//!
//! # Test Files
//!
//! - `storefront_backend` - catalog, account and error mapping
//! - `admin_backend` - analytics, order updates and installment review
//! - `chat_assistant` - keyword answers, Gemini and the fallback reply
//! - `storefront_routes` - query and form extraction through the router

use std::time::Duration;

use axum::Router;
use axum::middleware::from_fn;
use mobistore_storefront::AppState;
use mobistore_storefront::chat::{ChatAssistant, KeywordTable};
use mobistore_storefront::config::{StorefrontConfig, VietQrConfig};
use mobistore_storefront::middleware::{create_session_layer, csp_nonce_middleware};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::MockServer;

/// Timeout used by every client under test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Storefront backend client pointed at `server`.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn storefront_client(server: &MockServer) -> mobistore_storefront::backend::BackendClient {
    let config = mobistore_storefront::config::BackendConfig {
        base_url: server.uri(),
        timeout: TEST_TIMEOUT,
    };
    mobistore_storefront::backend::BackendClient::new(&config)
        .expect("Failed to build storefront backend client")
}

/// Storefront settings with the backend at `server` and no Gemini key.
#[must_use]
pub fn storefront_config(server: &MockServer) -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        backend: mobistore_storefront::config::BackendConfig {
            base_url: server.uri(),
            timeout: TEST_TIMEOUT,
        },
        vietqr: VietQrConfig {
            bank_id: "970422".to_string(),
            account_no: "0123456789".to_string(),
            account_name: "MOBISTORE".to_string(),
            template: "compact2".to_string(),
        },
        payment_window: Duration::from_secs(15 * 60),
        gemini: None,
        json_logs: false,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Storefront router with sessions and CSP nonces, backed by `server`.
#[must_use]
pub fn storefront_app(server: &MockServer) -> Router {
    let config = storefront_config(server);
    let session_layer = create_session_layer(&config);
    let state = AppState::from_parts(
        config,
        storefront_client(server),
        ChatAssistant::new(KeywordTable::default(), None),
    );

    Router::new()
        .merge(mobistore_storefront::routes::routes())
        .layer(session_layer)
        .layer(from_fn(csp_nonce_middleware))
        .with_state(state)
}

/// Admin backend client pointed at `server`.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn admin_client(server: &MockServer) -> mobistore_admin::backend::AdminBackendClient {
    let config = mobistore_admin::config::BackendConfig {
        base_url: server.uri(),
        timeout: TEST_TIMEOUT,
    };
    mobistore_admin::backend::AdminBackendClient::new(&config)
        .expect("Failed to build admin backend client")
}

/// Gemini settings pointed at `server`.
#[must_use]
pub fn gemini_config(server: &MockServer) -> mobistore_storefront::config::GeminiConfig {
    mobistore_storefront::config::GeminiConfig {
        api_key: SecretString::from("test-key"),
        model: "gemini-test".to_string(),
        api_url: server.uri(),
    }
}

/// Path the Gemini client posts to for [`gemini_config`].
pub const GEMINI_PATH: &str = "/v1beta/models/gemini-test:generateContent";

/// A catalog product as the backend returns it.
#[must_use]
pub fn product_json(id: &str, name: &str, price: u64) -> Value {
    json!({
        "_id": id,
        "name": name,
        "brand": { "_id": "b1", "name": "Apple" },
        "price": price,
        "images": [format!("https://cdn.mobistore.vn/{id}.jpg")],
        "stock": 12,
        "variants": []
    })
}

/// A login answer for a user with `role`.
#[must_use]
pub fn auth_json(role: &str) -> Value {
    json!({
        "token": "jwt-token",
        "user": {
            "_id": "u1",
            "name": "Nguyễn Văn A",
            "email": "a@mobistore.vn",
            "role": role
        }
    })
}

/// An admin order listing row.
#[must_use]
pub fn order_json(id: &str, status: &str, total: u64) -> Value {
    json!({
        "_id": id,
        "orderCode": format!("MS-{id}"),
        "user": { "_id": "u1", "name": "Nguyễn Văn A", "email": "a@mobistore.vn" },
        "items": [{ "name": "iPhone 15", "quantity": 1 }],
        "totalAmount": total,
        "status": status,
        "paymentMethod": "cod",
        "isPaid": false,
        "isInstallment": false,
        "createdAt": "2026-03-14T09:30:00Z"
    })
}
