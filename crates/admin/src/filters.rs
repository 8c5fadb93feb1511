//! Askama filters for the admin templates.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Current year, for the footer.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}
