//! Admin authentication extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, keys};

/// Extractor that requires a signed-in admin.
///
/// ```rust,ignore
/// async fn dashboard(State(state): State<AppState>, RequireAdmin(admin): RequireAdmin) -> ... {
///     let summary = state.backend().dashboard_summary(&admin.token).await?;
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Rejection for [`RequireAdmin`].
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Bare 401 (no session layer, or HTMX requests).
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin: Option<CurrentAdmin> = session.get(keys::CURRENT_ADMIN).await.ok().flatten();
        admin.map(Self).ok_or_else(|| {
            if parts.headers.contains_key("hx-request") {
                AdminAuthRejection::Unauthorized
            } else {
                AdminAuthRejection::RedirectToLogin
            }
        })
    }
}

/// Extractor that optionally gets the signed-in admin.
pub struct OptionalAdmin(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdmin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Store the signed-in admin, cycling the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_ADMIN, admin).await
}

/// Drop the whole session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
