//! Cart route handlers.
//!
//! The cart lives in the backend, keyed by the shopper's token, so every
//! cart operation needs a login. Mutations answer with HTMX fragments and
//! fire `cart-updated` so the header badge refreshes itself.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::{CartItemId, ProductId, VariantId};

use super::PageContext;
use super::views::CartView;
use crate::backend::AddToCartRequest;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, RequireAuth};
use crate::state::AppState;

/// Largest quantity accepted for one line.
const MAX_LINE_QUANTITY: u32 = 10;

// =============================================================================
// Form Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    /// The product page shares its `variant` radio with the price fragment.
    #[serde(alias = "variant")]
    pub variant_id: Option<String>,
    pub color: Option<String>,
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Cart items fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

fn items_fragment(cart: CartView) -> Response {
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Cart page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
) -> impl IntoResponse {
    let cart = match state.backend().get_cart(&user.token).await {
        Ok(cart) => CartView::from(&cart),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch cart");
            CartView::empty()
        }
    };

    CartShowTemplate {
        page: PageContext::load(&session, Some(&user), nonce, "Giỏ hàng").await,
        cart,
    }
}

/// Add an item (HTMX); answers with the count badge.
///
/// Guests are sent to the login page with `HX-Redirect`.
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let Some(user) = user else {
        return (
            AppendHeaders([("HX-Redirect", "/auth/login")]),
            StatusCode::NO_CONTENT,
        )
            .into_response();
    };

    let request = AddToCartRequest {
        product_id: ProductId::new(form.product_id.trim()),
        variant_id: non_empty(form.variant_id).map(VariantId::new),
        color: non_empty(form.color),
        quantity: form.quantity.unwrap_or(1).clamp(1, MAX_LINE_QUANTITY),
    };

    match state.backend().add_to_cart(&user.token, &request).await {
        Ok(cart) => {
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", request.product_id.as_str())]),
            );
            let count = CartView::from(&cart).item_count;
            (
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                CartCountTemplate { count },
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to add item to cart");
            let message = e
                .user_message()
                .unwrap_or("Không thể thêm vào giỏ hàng")
                .to_string();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(format!(
                    "<span class=\"text-error\">{}</span>",
                    escape_html(&message)
                )),
            )
                .into_response()
        }
    }
}

/// Update a line's quantity (HTMX); a quantity of 0 removes the line.
#[instrument(skip(state, user))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let item_id = CartItemId::new(form.item_id);
    let backend = state.backend();

    let result = if form.quantity == 0 {
        backend.remove_cart_item(&user.token, &item_id).await
    } else {
        backend
            .update_cart_item(&user.token, &item_id, form.quantity.min(MAX_LINE_QUANTITY))
            .await
    };

    match result {
        Ok(cart) => items_fragment(CartView::from(&cart)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to update cart");
            reload_items(&state, &user.token).await
        }
    }
}

/// Remove a line (HTMX). The button carries `hx-confirm`.
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let item_id = CartItemId::new(form.item_id);

    match state.backend().remove_cart_item(&user.token, &item_id).await {
        Ok(cart) => items_fragment(CartView::from(&cart)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to remove cart item");
            reload_items(&state, &user.token).await
        }
    }
}

/// Re-render the items from the backend's current cart after a failed edit.
async fn reload_items(state: &AppState, token: &str) -> Response {
    let cart = state
        .backend()
        .get_cart(token)
        .await
        .map_or_else(|_| CartView::empty(), |cart| CartView::from(&cart));
    items_fragment(cart)
}

/// Count badge (HTMX); guests always see 0.
#[instrument(skip_all)]
pub async fn count(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    let count = match user {
        Some(user) => state
            .backend()
            .get_cart(&user.token)
            .await
            .map(|cart| CartView::from(&cart).item_count)
            .unwrap_or(0),
        None => 0,
    };

    CartCountTemplate { count }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_trims() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some(" v1 ".to_string())).as_deref(), Some("v1"));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & y</b>"), "&lt;b&gt;&quot;x&quot; &amp; y&lt;/b&gt;");
    }
}
