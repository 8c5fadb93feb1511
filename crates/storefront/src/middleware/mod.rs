//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers
//! 2. `TraceLayer`
//! 3. Request ID
//! 4. CSP nonce
//! 5. Security headers
//! 6. Session layer (in-memory store)
//! 7. Rate limiting on auth and chat routes

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user, take_return_to};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::{auth_rate_limiter, chat_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::{SecurityHeaders, security_headers_middleware};
pub use session::create_session_layer;
