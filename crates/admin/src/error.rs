//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Server-side failures are captured
//! to Sentry before responding; staff only see a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::backend::BackendError;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend API call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

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
            Self::Backend(err) => {
                matches!(err, BackendError::Http(_) | BackendError::Parse(_))
                    || matches!(err, BackendError::Status { status, .. } if *status >= 500)
            }
            Self::Session(_) | Self::Internal(_) => true,
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    /// HTTP status sent to the client.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Backend(err) => match err {
                BackendError::Unauthorized => StatusCode::UNAUTHORIZED,
                BackendError::Forbidden => StatusCode::FORBIDDEN,
                BackendError::NotFound(_) => StatusCode::NOT_FOUND,
                BackendError::Status { status, .. } if (400..500).contains(status) => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Expired token or revoked role: sign in again
        if matches!(
            self,
            Self::Backend(BackendError::Unauthorized | BackendError::Forbidden)
        ) {
            return Redirect::to("/auth/login?error=session").into_response();
        }

        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let message = match &self {
            Self::Backend(err) => err.user_message().map_or_else(
                || "Backend tạm thời không phản hồi".to_string(),
                String::from,
            ),
            Self::Session(_) | Self::Internal(_) => "Đã có lỗi xảy ra".to_string(),
            Self::NotFound(_) => "Không tìm thấy".to_string(),
            Self::BadRequest(message) => message.clone(),
        };

        (self.status(), message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Tag the Sentry scope with the signed-in admin.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_token_redirects_to_login() {
        for err in [BackendError::Unauthorized, BackendError::Forbidden] {
            let response = AppError::Backend(err).into_response();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Backend(BackendError::Status {
                status: 422,
                message: "bad".into()
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Backend(BackendError::Status {
                status: 500,
                message: String::new()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_only_server_errors_are_captured() {
        assert!(AppError::Internal("x".into()).is_server_error());
        assert!(!AppError::BadRequest("x".into()).is_server_error());
        assert!(!AppError::Backend(BackendError::NotFound(String::new())).is_server_error());
    }
}
