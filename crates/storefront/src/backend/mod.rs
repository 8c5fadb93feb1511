//! Commerce backend REST API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for products, carts, orders and
//!   accounts; this crate never stores any of it
//! - Authenticated calls carry the session-held token as a bearer token
//! - Catalog reads are cached via `moka` (5 minute TTL)
//! - Responses may be a bare payload or wrapped as `{ "data": ... }`
//!
//! # Example
//!
//! ```rust,ignore
//! use mobistore_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//! let product = client.get_product(&product_id).await?;
//! let cart = client.add_to_cart(&token, &request).await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::BackendClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The session token was missing, expired or rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl BackendError {
    /// Message suitable for showing next to a form, for client-side errors.
    ///
    /// Returns `None` for server-side failures, which should not be echoed.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Status { status, message } if (400..500).contains(status) => Some(message),
            Self::NotFound(message) => Some(message),
            _ => None,
        }
    }
}
