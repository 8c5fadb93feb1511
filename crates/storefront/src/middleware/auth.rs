//! Shopper authentication extractors.
//!
//! The backend issues the bearer token; we only keep it in the session next
//! to the user's identity and hand it back on every authenticated call.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, keys};

/// Extractor that requires a logged-in shopper.
///
/// Page requests are redirected to the login page; `/api/` requests get a
/// bare 401.
///
/// ```rust,ignore
/// async fn orders(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> ... {
///     let orders = state.backend().my_orders(&user.token).await?;
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection for [`RequireAuth`].
pub enum AuthRejection {
    RedirectToLogin,
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: Option<CurrentUser> = session.get(keys::CURRENT_USER).await.ok().flatten();
        let Some(user) = user else {
            if parts.uri.path().starts_with("/api/") {
                return Err(AuthRejection::Unauthorized);
            }
            // HTMX fragment requests can't follow a redirect into a full page
            if parts.headers.contains_key("hx-request") {
                return Err(AuthRejection::Unauthorized);
            }
            let _ = session
                .insert(keys::RETURN_TO, parts.uri.path().to_string())
                .await;
            return Err(AuthRejection::RedirectToLogin);
        };

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the logged-in shopper.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the logged-in shopper in the session.
///
/// The session id is cycled first so a pre-login id can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Log out: drop everything held for this shopper.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

/// Take the path saved before a login redirect, if it is a local path.
pub async fn take_return_to(session: &Session) -> Option<String> {
    session
        .remove::<String>(keys::RETURN_TO)
        .await
        .ok()
        .flatten()
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
}
