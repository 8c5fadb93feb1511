//! Session middleware configuration for admin.
//!
//! In-memory sessions with stricter settings than the storefront:
//! SameSite=Strict and an 8 hour inactivity expiry.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "ms_admin_session";

/// Inactivity expiry (8 hours).
const SESSION_EXPIRY_SECONDS: i64 = 8 * 60 * 60;

/// Create the session layer.
#[must_use]
pub fn create_session_layer(config: &AdminConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
