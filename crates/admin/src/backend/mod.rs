//! Admin client for the commerce backend REST API.
//!
//! Same transport conventions as the storefront client: bearer token from
//! the session, bare or `{ "data": ... }` enveloped bodies, and status codes
//! mapped onto [`BackendError`]. Nothing is cached; the dashboard must show
//! current numbers.

mod client;
pub mod types;

pub use client::AdminBackendClient;
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

    /// The token is valid but lacks the admin role.
    #[error("Forbidden")]
    Forbidden,

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
    /// Message safe to show to staff, for client-side errors.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Status { status, message } if (400..500).contains(status) => Some(message),
            Self::NotFound(message) => Some(message),
            _ => None,
        }
    }
}
