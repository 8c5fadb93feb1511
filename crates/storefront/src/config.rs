//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `BACKEND_API_URL` - Base URL of the commerce backend REST API
//! - `VIETQR_BANK_ID` - Bank BIN or short code used in the VietQR image URL
//! - `VIETQR_ACCOUNT_NO` - Receiving account number
//! - `VIETQR_ACCOUNT_NAME` - Receiving account holder name
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `BACKEND_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `VIETQR_TEMPLATE` - VietQR image template (default: compact2)
//! - `PAYMENT_WINDOW_MINUTES` - Time allowed to complete a transfer (default: 15)
//! - `GEMINI_API_KEY` - Enables the generative fallback of the assistant widget
//! - `GEMINI_MODEL` - Model name (default: gemini-1.5-flash)
//! - `GEMINI_API_URL` - API base URL (default: <https://generativelanguage.googleapis.com>)
//! - `LOG_FORMAT` - `json` for JSON log lines, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Commerce backend settings
    pub backend: BackendConfig,
    /// Bank transfer QR settings
    pub vietqr: VietQrConfig,
    /// How long a bank-transfer order stays payable
    pub payment_window: Duration,
    /// Generative assistant settings (absent when no API key is set)
    pub gemini: Option<GeminiConfig>,
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
    /// Base URL, without trailing slash (e.g. `https://api.mobistore.vn/api`)
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Receiving account shown on the bank transfer QR code.
#[derive(Debug, Clone)]
pub struct VietQrConfig {
    pub bank_id: String,
    pub account_no: String,
    pub account_name: String,
    pub template: String,
}

/// Gemini `generateContent` settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: SecretString,
    pub model: String,
    pub api_url: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the Gemini key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let backend = BackendConfig::from_env()?;
        let vietqr = VietQrConfig::from_env()?;
        let payment_minutes: u64 = parse_env("PAYMENT_WINDOW_MINUTES", "15")?;
        if payment_minutes == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PAYMENT_WINDOW_MINUTES".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let gemini = GeminiConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            vietqr,
            payment_window: Duration::from_secs(payment_minutes * 60),
            gemini,
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
    /// Load backend settings; shared with the admin binary's variable names.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `BACKEND_API_URL` is missing or not a URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("BACKEND_API_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_API_URL".to_string(), e.to_string()))?;
        let timeout_secs: u64 = parse_env("BACKEND_TIMEOUT_SECS", "15")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl VietQrConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bank_id: get_required_env("VIETQR_BANK_ID")?,
            account_no: get_required_env("VIETQR_ACCOUNT_NO")?,
            account_name: get_required_env("VIETQR_ACCOUNT_NAME")?,
            template: get_env_or_default("VIETQR_TEMPLATE", "compact2"),
        })
    }
}

impl GeminiConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(key) = get_optional_env("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };
        validate_secret_strength(&key, "GEMINI_API_KEY")?;

        Ok(Some(Self {
            api_key: SecretString::from(key),
            model: get_env_or_default("GEMINI_MODEL", "gemini-1.5-flash"),
            api_url: get_env_or_default(
                "GEMINI_API_URL",
                "https://generativelanguage.googleapis.com",
            )
            .trim_end_matches('/')
            .to_string(),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            backend: BackendConfig {
                base_url: "http://localhost:5000/api".to_string(),
                timeout: Duration::from_secs(15),
            },
            vietqr: VietQrConfig {
                bank_id: "970422".to_string(),
                account_no: "0123456789".to_string(),
                account_name: "CONG TY MOBISTORE".to_string(),
                template: "compact2".to_string(),
            },
            payment_window: Duration::from_secs(900),
            gemini: None,
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-gemini-key", "GEMINI_API_KEY").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let err = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "GEMINI_API_KEY").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("AIzaSyB3xY9mK2nL5pQ7rT0uW4zC6dE8fG1hJ", "K").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure() {
        let mut config = config();
        assert!(!config.is_secure());
        config.base_url = "https://mobistore.vn".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_gemini_config_debug_redacts_key() {
        let gemini = GeminiConfig {
            api_key: SecretString::from("AIzaSy-super-private-value"),
            model: "gemini-1.5-flash".to_string(),
            api_url: "https://generativelanguage.googleapis.com".to_string(),
        };
        let debug_output = format!("{gemini:?}");
        assert!(debug_output.contains("gemini-1.5-flash"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-private-value"));
    }
}
