//! Authentication route handlers.
//!
//! Login and registration go through the backend's user API; the returned
//! bearer token is kept in the session alongside the user's identity.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::validation::{FieldErrors, RegisterForm};

use super::{PageContext, set_flash};
use crate::backend::{AuthResponse, BackendError};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    CspNonce, OptionalAuth, clear_current_user, set_current_user, take_return_to,
};
use crate::models::{CurrentUser, Flash};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

fn login_error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Email hoặc mật khẩu không đúng",
        "missing" => "Vui lòng nhập email và mật khẩu",
        "session" => "Không thể tạo phiên đăng nhập, vui lòng thử lại",
        _ => "Đăng nhập thất bại, vui lòng thử lại",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub error: Option<&'static str>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub name: String,
    pub email: String,
    pub errors: FieldErrors,
}

/// Put a fresh login in the session and tag the Sentry scope.
async fn start_session(session: &Session, auth: AuthResponse) -> Result<CurrentUser, Response> {
    let user = CurrentUser::from_login(auth.user, auth.token);
    if let Err(e) = set_current_user(session, &user).await {
        tracing::error!(error = %e, "Failed to store login in session");
        return Err(Redirect::to("/auth/login?error=session").into_response());
    }
    set_sentry_user(&user.id, Some(&user.email));
    Ok(user)
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Logged-in users go home.
pub async fn login_page(
    session: Session,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        page: PageContext::load(&session, None, nonce, "Đăng nhập").await,
        error: query.error.as_deref().map(login_error_message),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Redirect::to("/auth/login?error=missing").into_response();
    }

    match state.backend().login(email, &form.password).await {
        Ok(auth) => {
            // The return path is taken before the id cycles.
            let return_to = take_return_to(&session).await;
            let user = match start_session(&session, auth).await {
                Ok(user) => user,
                Err(response) => return response,
            };
            tracing::info!(user_id = %user.id, "User logged in");
            set_flash(
                &session,
                Flash::success(format!("Xin chào, {}!", user.display_name())),
            )
            .await;
            Redirect::to(return_to.as_deref().unwrap_or("/")).into_response()
        }
        Err(BackendError::Unauthorized | BackendError::Status { .. }) => {
            tracing::warn!("Login rejected");
            Redirect::to("/auth/login?error=credentials").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Login request failed");
            Redirect::to("/auth/login?error=failed").into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    session: Session,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    RegisterTemplate {
        page: PageContext::load(&session, None, nonce, "Đăng ký").await,
        name: String::new(),
        email: String::new(),
        errors: FieldErrors::new(),
    }
    .into_response()
}

/// Handle registration form submission; a new account is logged in at once.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Form(form): Form<RegisterForm>,
) -> Response {
    let errors = match form.validate() {
        Ok(registration) => {
            match state
                .backend()
                .register(
                    &registration.name,
                    registration.email.as_str(),
                    &registration.password,
                )
                .await
            {
                Ok(auth) => {
                    let user = match start_session(&session, auth).await {
                        Ok(user) => user,
                        Err(response) => return response,
                    };
                    tracing::info!(user_id = %user.id, "User registered");
                    set_flash(&session, Flash::success("Tạo tài khoản thành công")).await;
                    return Redirect::to("/").into_response();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Registration failed");
                    let mut errors = FieldErrors::new();
                    errors.add(
                        "form",
                        e.user_message()
                            .unwrap_or("Không thể tạo tài khoản, vui lòng thử lại"),
                    );
                    errors
                }
            }
        }
        Err(errors) => errors,
    };

    RegisterTemplate {
        page: PageContext::load(&session, None, nonce, "Đăng ký").await,
        name: form.name,
        email: form.email,
        errors,
    }
    .into_response()
}

// =============================================================================
// Logout
// =============================================================================

/// Log out and return to the home page.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "Failed to clear session on logout");
    }
    clear_sentry_user();
    Redirect::to("/")
}
