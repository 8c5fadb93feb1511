//! Form validation.
//!
//! Each form type deserializes straight from an HTML form post and has a
//! `validate` method that either returns a cleaned value or every field
//! error at once, keyed by form field name, so the page can re-render with
//! inline messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::{INSTALLMENT_TERMS, MAX_DOWN_PAYMENT_PERCENT};
use crate::types::{AddressId, Email, PaymentMethod, PhoneNumber};

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize)]
#[error("{} invalid field(s)", .0.len())]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field` (first message per field wins).
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Message for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether `field` has an error.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(value)` when no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

fn required(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    label: &str,
    max: usize,
) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, format!("Vui lòng nhập {label}"));
    } else if trimmed.chars().count() > max {
        errors.add(field, format!("{label} tối đa {max} ký tự"));
    }
    trimmed.to_owned()
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

// =============================================================================
// Address
// =============================================================================

/// Address book form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AddressForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub city: Option<String>,
    pub district: Option<String>,
    pub ward: Option<String>,
    /// HTML checkbox: present (any value) when ticked.
    pub is_default: Option<String>,
}

/// A cleaned address ready to send to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedAddress {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    pub is_default: bool,
}

impl AddressForm {
    /// Maximum length of the name field.
    pub const MAX_NAME: usize = 100;
    /// Maximum length of the street address field.
    pub const MAX_ADDRESS: usize = 255;

    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<ValidatedAddress, FieldErrors> {
        let mut errors = FieldErrors::new();
        let full_name = required(&mut errors, "full_name", &self.full_name, "họ tên", Self::MAX_NAME);
        let address = required(
            &mut errors,
            "address",
            &self.address,
            "địa chỉ",
            Self::MAX_ADDRESS,
        );
        let phone = match PhoneNumber::parse(&self.phone) {
            Ok(phone) => phone.as_str().to_owned(),
            Err(e) => {
                errors.add("phone", format!("Số điện thoại không hợp lệ: {e}"));
                String::new()
            }
        };

        errors.finish(|| ValidatedAddress {
            full_name,
            phone,
            address,
            city: optional(self.city.as_deref()),
            district: optional(self.district.as_deref()),
            ward: optional(self.ward.as_deref()),
            is_default: self.is_default.is_some(),
        })
    }
}

// =============================================================================
// Profile
// =============================================================================

/// Account profile form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
}

/// A cleaned profile update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedProfile {
    pub name: String,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileForm {
    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<ValidatedProfile, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required(&mut errors, "name", &self.name, "họ tên", 100);
        let email = Email::parse(&self.email)
            .map_err(|e| errors.add("email", format!("Email không hợp lệ: {e}")))
            .ok();
        let phone = match optional(self.phone.as_deref()) {
            Some(raw) => match PhoneNumber::parse(&raw) {
                Ok(phone) => Some(phone.as_str().to_owned()),
                Err(e) => {
                    errors.add("phone", format!("Số điện thoại không hợp lệ: {e}"));
                    None
                }
            },
            None => None,
        };

        match email {
            Some(email) => errors.finish(|| ValidatedProfile { name, email, phone }),
            None => Err(errors),
        }
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Account registration form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// A cleaned registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedRegistration {
    pub name: String,
    pub email: Email,
    pub password: String,
}

impl RegisterForm {
    /// Minimum password length accepted by the backend.
    pub const MIN_PASSWORD: usize = 6;

    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<ValidatedRegistration, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required(&mut errors, "name", &self.name, "họ tên", 100);
        let email = Email::parse(&self.email)
            .map_err(|e| errors.add("email", format!("Email không hợp lệ: {e}")))
            .ok();
        if self.password.chars().count() < Self::MIN_PASSWORD {
            errors.add(
                "password",
                format!("Mật khẩu phải có ít nhất {} ký tự", Self::MIN_PASSWORD),
            );
        }
        if self.password != self.confirm_password {
            errors.add("confirm_password", "Mật khẩu xác nhận không khớp");
        }

        match email {
            Some(email) => errors.finish(|| ValidatedRegistration {
                name,
                email,
                password: self.password.clone(),
            }),
            None => Err(errors),
        }
    }
}

// =============================================================================
// Comments
// =============================================================================

/// Product comment / reply form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
    /// Star rating; empty string from an unselected radio group is `None`.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub rating: Option<u8>,
}

/// A cleaned comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedComment {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl CommentForm {
    /// Maximum comment length.
    pub const MAX_CONTENT: usize = 1000;

    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<ValidatedComment, FieldErrors> {
        let mut errors = FieldErrors::new();
        let content = required(
            &mut errors,
            "content",
            &self.content,
            "nội dung",
            Self::MAX_CONTENT,
        );
        if self.rating.is_some_and(|rating| !(1..=5).contains(&rating)) {
            errors.add("rating", "Đánh giá phải từ 1 đến 5 sao");
        }
        errors.finish(|| ValidatedComment {
            content,
            rating: self.rating,
        })
    }
}

// =============================================================================
// News
// =============================================================================

/// Admin news article form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsForm {
    #[serde(default)]
    pub title: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub content: String,
    pub image: Option<String>,
    /// Checkbox: present when ticked.
    pub published: Option<String>,
}

/// A cleaned news article, in the backend's field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedNews {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub published: bool,
}

impl NewsForm {
    pub const MAX_TITLE: usize = 200;
    pub const MAX_SUMMARY: usize = 500;

    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns every failing field. Title and content are required; the
    /// image must be an `http(s)` URL when given.
    pub fn validate(&self) -> Result<ValidatedNews, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = required(&mut errors, "title", &self.title, "tiêu đề", Self::MAX_TITLE);
        let content = required(&mut errors, "content", &self.content, "nội dung", usize::MAX);
        let summary = optional(self.summary.as_deref());
        if summary
            .as_ref()
            .is_some_and(|s| s.chars().count() > Self::MAX_SUMMARY)
        {
            errors.add(
                "summary",
                format!("Tóm tắt tối đa {} ký tự", Self::MAX_SUMMARY),
            );
        }
        let image = optional(self.image.as_deref());
        if image
            .as_ref()
            .is_some_and(|url| !url.starts_with("https://") && !url.starts_with("http://"))
        {
            errors.add("image", "Ảnh phải là đường dẫn http(s)");
        }

        errors.finish(|| ValidatedNews {
            title,
            summary,
            content,
            image,
            published: self.published.is_some(),
        })
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// Checkout form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    pub address_id: Option<String>,
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub installment_months: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub down_payment_percent: Option<u32>,
    pub note: Option<String>,
}

/// Installment terms chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstallmentTerms {
    pub months: u32,
    pub down_payment_percent: u32,
}

/// A cleaned checkout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub address_id: AddressId,
    pub payment_method: PaymentMethod,
    pub installment: Option<InstallmentTerms>,
    pub note: Option<String>,
}

impl CheckoutForm {
    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<ValidatedCheckout, FieldErrors> {
        let mut errors = FieldErrors::new();

        let address_id = optional(self.address_id.as_deref()).map(AddressId::new);
        if address_id.is_none() {
            errors.add("address_id", "Vui lòng chọn địa chỉ giao hàng");
        }

        let payment_method = match optional(self.payment_method.as_deref()) {
            None => {
                errors.add("payment_method", "Vui lòng chọn phương thức thanh toán");
                None
            }
            Some(raw) => raw
                .parse::<PaymentMethod>()
                .map_err(|_| errors.add("payment_method", "Phương thức thanh toán không hợp lệ"))
                .ok(),
        };

        let installment = if payment_method == Some(PaymentMethod::Installment) {
            match self.installment_months {
                Some(months) if INSTALLMENT_TERMS.contains(&months) => {
                    let down = self.down_payment_percent.unwrap_or(0);
                    if down > MAX_DOWN_PAYMENT_PERCENT {
                        errors.add(
                            "down_payment_percent",
                            format!("Trả trước tối đa {MAX_DOWN_PAYMENT_PERCENT}%"),
                        );
                    }
                    Some(InstallmentTerms {
                        months,
                        down_payment_percent: down,
                    })
                }
                _ => {
                    errors.add("installment_months", "Vui lòng chọn kỳ hạn trả góp");
                    None
                }
            }
        } else {
            None
        };

        match (address_id, payment_method) {
            (Some(address_id), Some(payment_method)) => errors.finish(|| ValidatedCheckout {
                address_id,
                payment_method,
                installment,
                note: optional(self.note.as_deref()),
            }),
            _ => Err(errors),
        }
    }
}

/// Treat an empty form or query value as absent before parsing it.
///
/// Use with `#[serde(default, deserialize_with = "empty_string_as_none")]`.
///
/// # Errors
///
/// Returns the parse error of `T` for a non-empty value that does not parse.
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> AddressForm {
        AddressForm {
            full_name: " Nguyễn Văn A ".to_string(),
            phone: "0912 345 678".to_string(),
            address: "12 Lê Lợi".to_string(),
            city: Some("Hà Nội".to_string()),
            district: Some("  ".to_string()),
            ward: None,
            is_default: Some("on".to_string()),
        }
    }

    #[test]
    fn test_address_valid_is_normalized() {
        let valid = address().validate().unwrap();
        assert_eq!(valid.full_name, "Nguyễn Văn A");
        assert_eq!(valid.phone, "0912345678");
        assert_eq!(valid.city.as_deref(), Some("Hà Nội"));
        assert_eq!(valid.district, None);
        assert!(valid.is_default);
    }

    #[test]
    fn test_address_empty_required_fields() {
        let form = AddressForm {
            address: String::new(),
            full_name: "   ".to_string(),
            ..address()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("address"));
        assert!(errors.has("full_name"));
        assert!(!errors.has("phone"));
        assert_eq!(errors.get("address"), Some("Vui lòng nhập địa chỉ"));
    }

    #[test]
    fn test_address_bad_phone() {
        let form = AddressForm {
            phone: "12345".to_string(),
            ..address()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.has("phone"));
    }

    #[test]
    fn test_address_camel_case_payload() {
        let json = serde_json::to_value(address().validate().unwrap()).unwrap();
        assert_eq!(json["fullName"], "Nguyễn Văn A");
        assert_eq!(json["isDefault"], true);
        assert!(json.get("district").is_none());
    }

    #[test]
    fn test_profile_optional_phone() {
        let form = ProfileForm {
            name: "Lan".to_string(),
            email: "lan@example.com".to_string(),
            phone: Some(String::new()),
        };
        let valid = form.validate().unwrap();
        assert_eq!(valid.phone, None);
    }

    #[test]
    fn test_profile_collects_all_errors() {
        let form = ProfileForm {
            name: String::new(),
            email: "nope".to_string(),
            phone: Some("abc".to_string()),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_register_password_rules() {
        let form = RegisterForm {
            name: "Minh".to_string(),
            email: "minh@example.com".to_string(),
            password: "12345".to_string(),
            confirm_password: "54321".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("password"));
        assert!(errors.has("confirm_password"));
    }

    #[test]
    fn test_comment_rating_bounds() {
        let ok = CommentForm {
            content: "Máy đẹp".to_string(),
            rating: Some(5),
        };
        assert!(ok.validate().is_ok());

        let bad = CommentForm {
            content: "Máy đẹp".to_string(),
            rating: Some(6),
        };
        assert!(bad.validate().unwrap_err().has("rating"));

        let empty = CommentForm::default();
        assert!(empty.validate().unwrap_err().has("content"));
    }

    #[test]
    fn test_checkout_requires_terms_for_installment() {
        let form = CheckoutForm {
            address_id: Some("a1".to_string()),
            payment_method: Some("installment".to_string()),
            installment_months: None,
            down_payment_percent: None,
            note: None,
        };
        assert!(form.validate().unwrap_err().has("installment_months"));

        let form = CheckoutForm {
            installment_months: Some(6),
            down_payment_percent: Some(30),
            ..form
        };
        let valid = form.validate().unwrap();
        assert_eq!(
            valid.installment,
            Some(InstallmentTerms {
                months: 6,
                down_payment_percent: 30
            })
        );
    }

    #[test]
    fn test_checkout_cod_ignores_terms() {
        let form = CheckoutForm {
            address_id: Some("a1".to_string()),
            payment_method: Some("cod".to_string()),
            installment_months: Some(7),
            down_payment_percent: None,
            note: Some("  ".to_string()),
        };
        let valid = form.validate().unwrap();
        assert_eq!(valid.payment_method, PaymentMethod::Cod);
        assert_eq!(valid.installment, None);
        assert_eq!(valid.note, None);
    }

    #[test]
    fn test_checkout_missing_everything() {
        let errors = CheckoutForm::default().validate().unwrap_err();
        assert!(errors.has("address_id"));
        assert!(errors.has("payment_method"));
    }

    #[test]
    fn test_news_requires_title_and_content() {
        let errors = NewsForm::default().validate().unwrap_err();
        assert!(errors.has("title"));
        assert!(errors.has("content"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_news_normalizes() {
        let form = NewsForm {
            title: "  iPhone 16 lên kệ ".to_string(),
            summary: Some(" ".to_string()),
            content: "Nội dung".to_string(),
            image: Some("ftp://x/y.png".to_string()),
            published: Some("on".to_string()),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("image"));

        let form = NewsForm {
            image: Some("https://cdn.mobistore.vn/a.png".to_string()),
            ..form
        };
        let news = form.validate().unwrap();
        assert_eq!(news.title, "iPhone 16 lên kệ");
        assert_eq!(news.summary, None);
        assert!(news.published);
    }
}
