//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//! - `BACKEND_API_URL` - Base URL of the commerce backend REST API
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `BACKEND_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `LOG_FORMAT` - `json` for JSON log lines, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Commerce backend settings
    pub backend: BackendConfig,
    /// Emit JSON log lines
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Commerce backend REST API settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let base_url = get_required_env("ADMIN_BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_BASE_URL".to_string(), e.to_string()))?;

        Ok(Self {
            host: parse_env("ADMIN_HOST", "127.0.0.1")?,
            port: parse_env("ADMIN_PORT", "3001")?,
            base_url: base_url.trim_end_matches('/').to_string(),
            backend: BackendConfig::from_env()?,
            json_logs: get_optional_env("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    /// Load backend settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `BACKEND_API_URL` is missing or not a URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("BACKEND_API_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_API_URL".to_string(), e.to_string()))?;
        let timeout_secs: u64 = parse_env("BACKEND_TIMEOUT_SECS", "15")?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "BACKEND_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> AdminConfig {
        AdminConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: base_url.to_string(),
            backend: BackendConfig {
                base_url: "http://localhost:5000/api".to_string(),
                timeout: Duration::from_secs(15),
            },
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config("http://localhost:3001").socket_addr();
        assert_eq!(addr.port(), 3001);
    }

    #[test]
    fn test_is_secure() {
        assert!(!config("http://localhost:3001").is_secure());
        assert!(config("https://admin.mobistore.vn").is_secure());
    }

    #[test]
    fn test_parse_env_default() {
        let port: u16 = parse_env("MOBISTORE_ADMIN_UNSET_PORT", "3001").unwrap();
        assert_eq!(port, 3001);
    }

    #[test]
    fn test_parse_env_invalid_default() {
        let err = parse_env::<u16>("MOBISTORE_ADMIN_UNSET_PORT", "abc").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "MOBISTORE_ADMIN_UNSET_PORT"));
    }
}
