//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Server-side failures are captured
//! to Sentry before responding; clients only ever see a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use mobistore_core::validation::FieldErrors;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend API call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Submitted form did not validate.
    #[error("Invalid form: {0}")]
    Validation(#[from] FieldErrors),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Backend(err) => matches!(
                err,
                BackendError::Http(_) | BackendError::Parse(_)
            ) || matches!(err, BackendError::Status { status, .. } if *status >= 500),
            Self::Session(_) | Self::Internal(_) => true,
            _ => false,
        }
    }

    /// HTTP status sent to the client.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Backend(err) => match err {
                BackendError::Unauthorized => StatusCode::UNAUTHORIZED,
                BackendError::NotFound(_) => StatusCode::NOT_FOUND,
                BackendError::Status { status, .. } if (400..500).contains(status) => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // An expired backend token means the shopper must sign in again
        if matches!(self, Self::Backend(BackendError::Unauthorized)) {
            return Redirect::to("/auth/login").into_response();
        }

        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Backend(err) => err.user_message().map_or_else(
                || "Dịch vụ tạm thời gián đoạn, vui lòng thử lại sau".to_string(),
                String::from,
            ),
            Self::Session(_) | Self::Internal(_) => "Đã có lỗi xảy ra".to_string(),
            Self::Validation(errors) => errors
                .iter()
                .map(|(_, message)| message)
                .collect::<Vec<_>>()
                .join("; "),
            Self::NotFound(_) => "Không tìm thấy trang".to_string(),
            Self::Unauthorized(_) => "Vui lòng đăng nhập".to_string(),
            Self::BadRequest(message) => message.clone(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after a successful login to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a shopper action.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "65f0...")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data.unwrap_or_default() {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_backend_unauthorized_redirects_to_login() {
        let response = AppError::Backend(BackendError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/auth/login")
        );
    }

    #[test]
    fn test_backend_status_mapping() {
        assert_eq!(
            status_of(AppError::Backend(BackendError::NotFound("order".into()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Backend(BackendError::Status {
                status: 409,
                message: "Hết hàng".into()
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Backend(BackendError::Status {
                status: 503,
                message: "down".into()
            })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status_of(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::Unauthorized("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::BadRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_are_flagged_for_capture() {
        assert!(AppError::Internal("x".into()).is_server_error());
        assert!(
            AppError::Backend(BackendError::Status {
                status: 500,
                message: String::new()
            })
            .is_server_error()
        );
        assert!(!AppError::Backend(BackendError::NotFound(String::new())).is_server_error());
    }
}
