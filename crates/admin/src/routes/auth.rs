//! Admin login and logout.
//!
//! Credentials are checked by the backend; only accounts with the `admin`
//! role get a session here.

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

use crate::backend::BackendError;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdmin, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

fn login_error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Email hoặc mật khẩu không đúng",
        "missing" => "Vui lòng nhập email và mật khẩu",
        "forbidden" => "Tài khoản không có quyền quản trị",
        "session" => "Phiên đăng nhập đã hết hạn, vui lòng đăng nhập lại",
        _ => "Đăng nhập thất bại, vui lòng thử lại",
    }
}

/// Standalone page; it does not extend the sidebar layout.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
}

/// Login page. Signed-in admins go to the dashboard.
pub async fn login_page(
    OptionalAdmin(admin): OptionalAdmin,
    Query(query): Query<LoginQuery>,
) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        error: query.error.as_deref().map(login_error_message),
    }
    .into_response()
}

/// Handle the login form.
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

    let auth = match state.backend().login(email, &form.password).await {
        Ok(auth) => auth,
        Err(BackendError::Unauthorized | BackendError::Status { .. }) => {
            tracing::warn!("Admin login rejected");
            return Redirect::to("/auth/login?error=credentials").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Admin login request failed");
            return Redirect::to("/auth/login?error=failed").into_response();
        }
    };

    let user_id = auth.user.id.clone();
    let Some(admin) = CurrentAdmin::from_login(auth.user, auth.token) else {
        tracing::warn!(user_id = %user_id, "Non-admin account tried to sign in");
        return Redirect::to("/auth/login?error=forbidden").into_response();
    };

    if let Err(e) = set_current_admin(&session, &admin).await {
        tracing::error!(error = %e, "Failed to store admin session");
        return Redirect::to("/auth/login?error=failed").into_response();
    }
    set_sentry_user(&admin.id, Some(&admin.email));
    tracing::info!(admin_id = %admin.id, "Admin logged in");
    Redirect::to("/").into_response()
}

/// Log out.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::error!(error = %e, "Failed to clear admin session");
    }
    clear_sentry_user();
    Redirect::to("/auth/login")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_error_messages() {
        assert_eq!(
            login_error_message("forbidden"),
            "Tài khoản không có quyền quản trị"
        );
        assert_eq!(
            login_error_message("anything"),
            "Đăng nhập thất bại, vui lòng thử lại"
        );
    }
}
