//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers
//! 2. `TraceLayer`
//! 3. Request ID
//! 4. Security headers (static CSP, HSTS when served over https)
//! 5. Session layer (in-memory store, SameSite=Strict)
//! 6. Login rate limiting

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAdmin, RequireAdmin, clear_current_admin, set_current_admin};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::{SecurityHeaders, security_headers_middleware};
pub use session::create_session_layer;
