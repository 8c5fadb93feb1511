//! Vietnamese mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("không được để trống")]
    Empty,
    /// The input contains characters other than digits, separators or a leading `+`.
    #[error("chỉ được chứa chữ số")]
    InvalidCharacter,
    /// The number does not start with `0` or `+84`.
    #[error("phải bắt đầu bằng 0 hoặc +84")]
    InvalidPrefix,
    /// The network digit after the prefix is not a mobile network.
    #[error("không phải số di động")]
    InvalidNetwork,
    /// Wrong number of digits.
    #[error("phải có 10 chữ số")]
    InvalidLength,
}

/// A Vietnamese mobile phone number, stored in national `0xxxxxxxxx` form.
///
/// Accepted input: an optional `+84` or `84` country prefix (or a leading
/// `0`), a mobile network digit (3, 5, 7, 8 or 9) and eight further digits.
/// Spaces, dots and dashes are ignored.
///
/// ```
/// use mobistore_core::PhoneNumber;
///
/// assert_eq!(PhoneNumber::parse("0912 345 678").unwrap().as_str(), "0912345678");
/// assert_eq!(PhoneNumber::parse("+84 912.345.678").unwrap().as_str(), "0912345678");
/// assert!(PhoneNumber::parse("0212345678").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const NETWORK_DIGITS: [char; 5] = ['3', '5', '7', '8', '9'];
    const SUBSCRIBER_DIGITS: usize = 8;

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] describing the first problem found.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let compact: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '.' | '-'))
            .collect();
        if compact.is_empty() {
            return Err(PhoneError::Empty);
        }

        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::InvalidCharacter);
        }

        let national = if let Some(rest) = digits.strip_prefix("84") {
            if compact.starts_with('+') || rest.len() == Self::SUBSCRIBER_DIGITS + 1 {
                rest
            } else {
                digits.strip_prefix('0').ok_or(PhoneError::InvalidPrefix)?
            }
        } else if compact.starts_with('+') {
            return Err(PhoneError::InvalidPrefix);
        } else {
            digits.strip_prefix('0').ok_or(PhoneError::InvalidPrefix)?
        };

        let mut chars = national.chars();
        let network = chars.next().ok_or(PhoneError::InvalidLength)?;
        if !Self::NETWORK_DIGITS.contains(&network) {
            return Err(PhoneError::InvalidNetwork);
        }
        if chars.count() != Self::SUBSCRIBER_DIGITS {
            return Err(PhoneError::InvalidLength);
        }

        Ok(Self(format!("0{national}")))
    }

    /// Returns the number in national form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the number in `+84` international form.
    #[must_use]
    pub fn international(&self) -> String {
        format!("+84{}", self.0.get(1..).unwrap_or_default())
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_national_form() {
        assert_eq!(PhoneNumber::parse("0912345678").unwrap().as_str(), "0912345678");
        assert_eq!(PhoneNumber::parse("0387-654-321").unwrap().as_str(), "0387654321");
    }

    #[test]
    fn test_international_prefixes() {
        assert_eq!(PhoneNumber::parse("+84912345678").unwrap().as_str(), "0912345678");
        assert_eq!(PhoneNumber::parse("84912345678").unwrap().as_str(), "0912345678");
    }

    #[test]
    fn test_international_rendering() {
        let phone = PhoneNumber::parse("0912345678").unwrap();
        assert_eq!(phone.international(), "+84912345678");
    }

    #[test]
    fn test_rejects_landline_network() {
        assert_eq!(
            PhoneNumber::parse("0212345678"),
            Err(PhoneError::InvalidNetwork)
        );
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert_eq!(PhoneNumber::parse("091234567"), Err(PhoneError::InvalidLength));
        assert_eq!(
            PhoneNumber::parse("09123456789"),
            Err(PhoneError::InvalidLength)
        );
    }

    #[test]
    fn test_rejects_letters_and_prefix() {
        assert_eq!(
            PhoneNumber::parse("09123abc78"),
            Err(PhoneError::InvalidCharacter)
        );
        assert_eq!(PhoneNumber::parse("912345678"), Err(PhoneError::InvalidPrefix));
        assert_eq!(PhoneNumber::parse("+1912345678"), Err(PhoneError::InvalidPrefix));
        assert_eq!(PhoneNumber::parse(""), Err(PhoneError::Empty));
    }
}
