//! Security headers middleware.
//!
//! The CSP is assembled once at startup because the image sources depend on
//! configuration: product photos are served from the backend host and the
//! transfer QR from `img.vietqr.io`.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;

/// Scripts loaded from a CDN (HTMX).
const SCRIPT_CDN: &str = "https://unpkg.com";
const VIETQR_IMAGES: &str = "https://img.vietqr.io";

/// Shared CSP template; `{nonce}` is filled per request.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    csp_template: String,
}

impl SecurityHeaders {
    /// Build the policy for a backend at `backend_url`.
    #[must_use]
    pub fn new(backend_url: &str) -> Self {
        let image_host = url::Url::parse(backend_url)
            .ok()
            .map(|url| url.origin().ascii_serialization())
            .filter(|origin| origin != "null")
            .unwrap_or_default();

        let csp_template = format!(
            "default-src 'none'; \
             script-src 'self' 'nonce-{{nonce}}' {SCRIPT_CDN}; \
             style-src 'self'; \
             font-src 'self'; \
             img-src 'self' data: {VIETQR_IMAGES} {image_host}; \
             connect-src 'self'; \
             frame-src 'none'; \
             object-src 'none'; \
             base-uri 'self'; \
             form-action 'self'; \
             frame-ancestors 'none'"
        );

        Self { csp_template }
    }

    /// Policy for one response.
    #[must_use]
    pub fn csp(&self, nonce: &str) -> String {
        self.csp_template.replace("{nonce}", nonce)
    }
}

/// Add security headers to every response.
///
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: same-origin`
/// - `Content-Security-Policy` (see [`SecurityHeaders`])
/// - `Permissions-Policy` denying sensors and media capture
/// - `Cache-Control: no-store` (pages carry cart and account data)
/// - `Cross-Origin-*` isolation
pub async fn security_headers_middleware(
    State(policy): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let nonce = request
        .extensions()
        .get::<CspNonce>()
        .map(|n| n.value().to_string())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("same-origin"));

    match HeaderValue::from_str(&policy.csp(&nonce)) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => tracing::error!(error = %e, "Invalid CSP header value"),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             payment=(), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    // Static assets set their own caching; everything else is per-shopper
    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    // Product photos and the QR come from hosts that don't send CORP
    headers.insert(
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("credentialless"),
    );
    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_allows_backend_and_vietqr_images() {
        let policy = SecurityHeaders::new("https://api.mobistore.vn/api");
        let csp = policy.csp("abc123");
        assert!(csp.contains("img-src 'self' data: https://img.vietqr.io https://api.mobistore.vn;"));
        assert!(csp.contains("'nonce-abc123'"));
    }

    #[test]
    fn test_csp_keeps_port_of_backend_origin() {
        let csp = SecurityHeaders::new("http://localhost:5000/api").csp("n");
        assert!(csp.contains("http://localhost:5000;"));
    }
}
