//! Backend response body handling shared by the storefront and admin clients.
//!
//! The backend answers either with a bare JSON value or with a
//! `{ "success": true, "data": ... }` envelope, and reports failures as
//! `{ "message": ... }` or `{ "error": ... }`. Status-to-error mapping stays
//! with each client since the two surfaces treat 403 differently.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Characters of a response body kept in log lines.
pub const BODY_EXCERPT: usize = 300;

/// Decode a success body, unwrapping a `{ "data": ... }` envelope.
///
/// An empty body decodes as JSON `null`.
///
/// ```
/// use mobistore_core::transport::decode_body;
///
/// let bare: Vec<u32> = decode_body("[1,2]").unwrap();
/// let wrapped: Vec<u32> = decode_body(r#"{"success":true,"data":[1,2]}"#).unwrap();
/// assert_eq!(bare, wrapped);
/// ```
///
/// # Errors
///
/// Returns the JSON error if the body is malformed or does not fit `T`.
pub fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, serde_json::Error> {
    let value: Value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body)?
    };
    serde_json::from_value(unwrap_envelope(value))
}

/// The `data` member of an envelope, or the value itself.
#[must_use]
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// The `message` (or `error`) field of a JSON error body.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

/// First [`BODY_EXCERPT`] characters of `body`.
#[must_use]
pub fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT).collect()
}

/// Percent-encode one path segment.
#[must_use]
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_empty_body_as_null() {
        let value: Value = decode_body("").unwrap();
        assert!(value.is_null());
        let unit: Option<u32> = decode_body("  ").unwrap();
        assert_eq!(unit, None);
    }

    #[test]
    fn test_decode_envelope_with_null_data() {
        let value: Option<Vec<u32>> = decode_body(r#"{"success":true,"data":null}"#).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_decode_malformed_body_fails() {
        assert!(decode_body::<Vec<u32>>("<html>").is_err());
        assert!(decode_body::<Vec<u32>>(r#"{"data":"nope"}"#).is_err());
    }

    #[test]
    fn test_error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"message":"Hết hàng","error":"x"}"#).as_deref(),
            Some("Hết hàng")
        );
        assert_eq!(error_message(r#"{"error":"Sai mật khẩu"}"#).as_deref(), Some("Sai mật khẩu"));
        assert_eq!(error_message(r#"{"message":"  "}"#), None);
        assert_eq!(error_message("Bad Gateway"), None);
    }

    #[test]
    fn test_excerpt_counts_characters() {
        let body = "đ".repeat(BODY_EXCERPT + 10);
        assert_eq!(excerpt(&body).chars().count(), BODY_EXCERPT);
        assert_eq!(excerpt("ngắn"), "ngắn");
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(encode_segment("665f1c2e"), "665f1c2e");
    }
}
