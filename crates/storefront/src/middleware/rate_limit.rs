//! Per-IP rate limiting with `governor` / `tower_governor`.
//!
//! - `auth_rate_limiter`: login and registration (~10/min)
//! - `chat_rate_limiter`: both chat widgets (~20/min)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Proxy headers carrying the client address, most trusted first.
const CLIENT_IP_HEADERS: [&str; 4] = [
    "cf-connecting-ip",
    "x-forwarded-for",
    "x-real-ip",
    "fly-client-ip",
];

/// Key extractor using proxy headers, then the socket peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        let from_headers = CLIENT_IP_HEADERS.iter().find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                // X-Forwarded-For lists the original client first
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        });

        from_headers
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn limiter(replenish_secs: u64, burst: u32) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(replenish_secs)
        .burst_size(burst)
        .finish()
        .expect("rate limiter periods and bursts are non-zero constants");
    GovernorLayer::new(Arc::new(config))
}

/// Login/registration: one request per 6 seconds, burst of 5.
///
/// # Panics
///
/// Never: the configuration only uses non-zero constants.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    limiter(6, 5)
}

/// Chat widgets: one request per 3 seconds, burst of 10.
///
/// # Panics
///
/// Never: the configuration only uses non-zero constants.
#[must_use]
pub fn chat_rate_limiter() -> RateLimiterLayer {
    limiter(3, 10)
}
