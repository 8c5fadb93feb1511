//! Account route handlers: profile and address book.
//!
//! Forms are validated here before anything reaches the backend; failures
//! re-render the page with inline messages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::AddressId;
use mobistore_core::validation::{AddressForm, FieldErrors, ProfileForm};

use super::{PageContext, set_flash};
use crate::backend::{Address, User};
use crate::error::Result;
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth, set_current_user};
use crate::models::{CurrentUser, Flash};
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub form: ProfileForm,
    pub errors: FieldErrors,
}

#[derive(Clone)]
pub struct AddressView {
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub ward: String,
    pub district: String,
    pub city: String,
    pub line: String,
    pub is_default: bool,
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id.to_string(),
            full_name: address.full_name.clone(),
            phone: address.phone.clone(),
            address: address.address.clone(),
            ward: address.ward.clone().unwrap_or_default(),
            district: address.district.clone().unwrap_or_default(),
            city: address.city.clone().unwrap_or_default(),
            line: address.one_line(),
            is_default: address.is_default,
        }
    }
}

/// Values of the add/edit form.
#[derive(Clone, Default)]
pub struct AddressFormView {
    pub action: String,
    pub title: &'static str,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub ward: String,
    pub district: String,
    pub city: String,
    pub is_default: bool,
}

impl AddressFormView {
    fn new(form: &AddressForm, editing: Option<&str>) -> Self {
        let (action, title) = match editing {
            Some(id) => (format!("/account/addresses/{id}"), "Sửa địa chỉ"),
            None => ("/account/addresses".to_string(), "Thêm địa chỉ mới"),
        };
        Self {
            action,
            title,
            full_name: form.full_name.clone(),
            phone: form.phone.clone(),
            address: form.address.clone(),
            ward: form.ward.clone().unwrap_or_default(),
            district: form.district.clone().unwrap_or_default(),
            city: form.city.clone().unwrap_or_default(),
            is_default: form.is_default.is_some(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub page: PageContext,
    pub addresses: Vec<AddressView>,
    /// Add form, or the edit form re-shown after a failed submit.
    pub form: AddressFormView,
    pub errors: FieldErrors,
}

fn profile_form(user: &User) -> ProfileForm {
    ProfileForm {
        name: user.name.clone(),
        email: user.email.clone(),
        phone: user.phone.clone(),
    }
}

// =============================================================================
// Profile
// =============================================================================

/// Profile page.
#[instrument(skip_all)]
pub async fn profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let profile = state.backend().me(&user.token).await?;

    Ok(ProfileTemplate {
        page: PageContext::load(&session, Some(&user), nonce, "Tài khoản").await,
        form: profile_form(&profile),
        errors: FieldErrors::new(),
    })
}

/// Update the profile.
#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let errors = match form.validate() {
        Ok(profile) => match state.backend().update_profile(&user.token, &profile).await {
            Ok(updated) => {
                let refreshed = CurrentUser {
                    name: updated.name,
                    email: updated.email,
                    ..user
                };
                set_current_user(&session, &refreshed).await?;
                set_flash(&session, Flash::success("Đã cập nhật thông tin tài khoản")).await;
                return Ok(Redirect::to("/account").into_response());
            }
            Err(e) => {
                let Some(message) = e.user_message().map(str::to_owned) else {
                    return Err(e.into());
                };
                let mut errors = FieldErrors::new();
                errors.add("form", message);
                errors
            }
        },
        Err(errors) => errors,
    };

    Ok(ProfileTemplate {
        page: PageContext::load(&session, Some(&user), nonce, "Tài khoản").await,
        form,
        errors,
    }
    .into_response())
}

// =============================================================================
// Addresses
// =============================================================================

async fn render_addresses(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    nonce: String,
    form: AddressForm,
    editing: Option<String>,
    errors: FieldErrors,
) -> Result<Response> {
    let addresses = state.backend().list_addresses(&user.token).await?;

    Ok(AddressesTemplate {
        page: PageContext::load(session, Some(user), nonce, "Sổ địa chỉ").await,
        addresses: addresses.iter().map(AddressView::from).collect(),
        form: AddressFormView::new(&form, editing.as_deref()),
        errors,
    }
    .into_response())
}

/// Address book.
#[instrument(skip_all)]
pub async fn addresses(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
) -> Result<Response> {
    render_addresses(
        &state,
        &session,
        &user,
        nonce,
        AddressForm::default(),
        None,
        FieldErrors::new(),
    )
    .await
}

/// Add an address.
#[instrument(skip_all)]
pub async fn create_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    match form.validate() {
        Ok(address) => {
            state.backend().create_address(&user.token, &address).await?;
            set_flash(&session, Flash::success("Đã thêm địa chỉ mới")).await;
            Ok(Redirect::to("/account/addresses").into_response())
        }
        Err(errors) => render_addresses(&state, &session, &user, nonce, form, None, errors).await,
    }
}

/// Update an address.
#[instrument(skip(state, session, user, nonce, form), fields(address_id = %id))]
pub async fn update_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
    Path(id): Path<String>,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    match form.validate() {
        Ok(address) => {
            state
                .backend()
                .update_address(&user.token, &AddressId::new(id.as_str()), &address)
                .await?;
            set_flash(&session, Flash::success("Đã cập nhật địa chỉ")).await;
            Ok(Redirect::to("/account/addresses").into_response())
        }
        Err(errors) => {
            render_addresses(&state, &session, &user, nonce, form, Some(id), errors).await
        }
    }
}

/// Delete an address.
#[instrument(skip(state, session, user), fields(address_id = %id))]
pub async fn delete_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Redirect> {
    state
        .backend()
        .delete_address(&user.token, &AddressId::new(id))
        .await?;
    set_flash(&session, Flash::success("Đã xóa địa chỉ")).await;
    Ok(Redirect::to("/account/addresses"))
}

/// Make an address the default.
#[instrument(skip(state, session, user), fields(address_id = %id))]
pub async fn set_default_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Redirect> {
    state
        .backend()
        .set_default_address(&user.token, &AddressId::new(id))
        .await?;
    set_flash(&session, Flash::success("Đã đặt làm địa chỉ mặc định")).await;
    Ok(Redirect::to("/account/addresses"))
}
