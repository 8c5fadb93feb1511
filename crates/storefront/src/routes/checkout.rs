//! Checkout and bank transfer payment.
//!
//! Placing an order goes straight to the backend. Bank transfers then show
//! a VietQR code with a countdown; the shopper's "I have paid" only clears
//! the cart, staff confirm the money from the admin.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::pricing::{INSTALLMENT_TERMS, MAX_DOWN_PAYMENT_PERCENT, cart_subtotal, installment_plan};
use mobistore_core::validation::{CheckoutForm, FieldErrors, ValidatedCheckout};
use mobistore_core::{Money, OrderId, PaymentMethod};

use super::views::CartView;
use super::{PageContext, set_flash};
use crate::backend::{Address, Cart, CreateOrderRequest};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::models::{CurrentUser, Flash};
use crate::payment::{PaymentWindow, qr_image_url, transfer_memo};
use crate::state::AppState;

/// Down payment used for the installment preview until the shopper picks one.
const DEFAULT_DOWN_PAYMENT_PERCENT: u32 = 30;

// =============================================================================
// View Types
// =============================================================================

#[derive(Clone)]
pub struct AddressOptionView {
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub line: String,
    pub selected: bool,
}

#[derive(Clone)]
pub struct PaymentOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// One row of the installment preview table.
#[derive(Clone)]
pub struct InstallmentRowView {
    pub months: u32,
    pub down_payment: String,
    pub monthly: String,
    pub last_month: String,
    pub selected: bool,
}

#[derive(Clone, Copy)]
pub struct DownPaymentOptionView {
    pub percent: u32,
    pub selected: bool,
}

/// Installment preview for every allowed term.
#[must_use]
pub fn installment_rows(total: Money, down_payment_percent: u32, selected_months: Option<u32>) -> Vec<InstallmentRowView> {
    INSTALLMENT_TERMS
        .iter()
        .filter_map(|&months| installment_plan(total, months, down_payment_percent).ok())
        .map(|plan| InstallmentRowView {
            months: plan.months,
            down_payment: plan.down_payment.display(),
            monthly: plan.monthly.display(),
            last_month: plan.last_month.display(),
            selected: selected_months == Some(plan.months),
        })
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub addresses: Vec<AddressOptionView>,
    pub payment_methods: Vec<PaymentOptionView>,
    pub installments: Vec<InstallmentRowView>,
    pub down_payment_options: Vec<DownPaymentOptionView>,
    pub down_payment_percent: u32,
    pub note: String,
    pub errors: FieldErrors,
}

#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub page: PageContext,
    pub order_id: String,
    pub reference: String,
    pub amount: String,
    pub qr_url: String,
    pub memo: String,
    pub bank_id: String,
    pub account_no: String,
    pub account_name: String,
    pub countdown: String,
    pub deadline: String,
    pub expired: bool,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    pub down: Option<u32>,
}

// =============================================================================
// Helpers
// =============================================================================

struct CheckoutData {
    cart: Cart,
    addresses: Vec<Address>,
}

async fn load_checkout_data(state: &AppState, user: &CurrentUser) -> Result<CheckoutData, AppError> {
    let backend = state.backend();
    let (cart, addresses) = tokio::join!(
        backend.get_cart(&user.token),
        backend.list_addresses(&user.token),
    );
    let addresses = addresses.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load addresses");
        Vec::new()
    });
    Ok(CheckoutData {
        cart: cart?,
        addresses,
    })
}

fn render_checkout(
    page: PageContext,
    data: &CheckoutData,
    form: &CheckoutForm,
    errors: FieldErrors,
) -> CheckoutTemplate {
    let selected_address = form
        .address_id
        .clone()
        .or_else(|| data.addresses.iter().find(|a| a.is_default).map(|a| a.id.to_string()))
        .or_else(|| data.addresses.first().map(|a| a.id.to_string()));
    let selected_method = form
        .payment_method
        .clone()
        .unwrap_or_else(|| PaymentMethod::Cod.as_str().to_string());
    let down = form
        .down_payment_percent
        .unwrap_or(DEFAULT_DOWN_PAYMENT_PERCENT)
        .min(MAX_DOWN_PAYMENT_PERCENT);

    CheckoutTemplate {
        page,
        cart: CartView::from(&data.cart),
        addresses: data
            .addresses
            .iter()
            .map(|a| AddressOptionView {
                id: a.id.to_string(),
                full_name: a.full_name.clone(),
                phone: a.phone.clone(),
                line: a.one_line(),
                selected: selected_address.as_deref() == Some(a.id.as_str()),
            })
            .collect(),
        payment_methods: PaymentMethod::ALL
            .iter()
            .map(|m| PaymentOptionView {
                value: m.as_str(),
                label: m.label(),
                selected: m.as_str() == selected_method,
            })
            .collect(),
        installments: installment_rows(cart_subtotal(&data.cart.items), down, form.installment_months),
        down_payment_options: (0..=MAX_DOWN_PAYMENT_PERCENT)
            .step_by(10)
            .map(|percent| DownPaymentOptionView {
                percent,
                selected: percent == down,
            })
            .collect(),
        down_payment_percent: down,
        note: form.note.clone().unwrap_or_default(),
        errors,
    }
}

/// Build the order payload from a validated form.
///
/// # Errors
///
/// Returns a field error when the address is not in the shopper's book.
pub fn build_order(
    checkout: &ValidatedCheckout,
    addresses: &[Address],
    cart: &Cart,
) -> Result<CreateOrderRequest, FieldErrors> {
    let Some(address) = addresses.iter().find(|a| a.id == checkout.address_id) else {
        let mut errors = FieldErrors::new();
        errors.add("address_id", "Địa chỉ giao hàng không hợp lệ");
        return Err(errors);
    };

    Ok(CreateOrderRequest {
        shipping_address: address.to_shipping(),
        payment_method: checkout.payment_method,
        total_amount: cart_subtotal(&cart.items),
        is_installment: checkout.installment.is_some(),
        installment_months: checkout.installment.map(|t| t.months),
        down_payment_percent: checkout.installment.map(|t| t.down_payment_percent),
        note: checkout.note.clone(),
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Checkout form.
#[instrument(skip(state, session, user, nonce))]
pub async fn checkout_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<CheckoutQuery>,
) -> Result<Response, AppError> {
    let data = load_checkout_data(&state, &user).await?;
    if data.cart.items.is_empty() {
        set_flash(&session, Flash::info("Giỏ hàng của bạn đang trống")).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let form = CheckoutForm {
        down_payment_percent: query.down,
        ..CheckoutForm::default()
    };
    let page = PageContext::load(&session, Some(&user), nonce, "Thanh toán").await;
    Ok(render_checkout(page, &data, &form, FieldErrors::new()).into_response())
}

/// Place the order.
#[instrument(skip(state, session, user, nonce, form))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let data = load_checkout_data(&state, &user).await?;
    if data.cart.items.is_empty() {
        set_flash(&session, Flash::info("Giỏ hàng của bạn đang trống")).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let order = form
        .validate()
        .and_then(|checkout| build_order(&checkout, &data.addresses, &data.cart));
    let request = match order {
        Ok(request) => request,
        Err(errors) => {
            let page = PageContext::load(&session, Some(&user), nonce, "Thanh toán").await;
            return Ok(render_checkout(page, &data, &form, errors).into_response());
        }
    };

    let order = match state.backend().create_order(&user.token, &request).await {
        Ok(order) => order,
        Err(e) => {
            let Some(message) = e.user_message().map(str::to_owned) else {
                return Err(e.into());
            };
            let mut errors = FieldErrors::new();
            errors.add("order", message);
            let page = PageContext::load(&session, Some(&user), nonce, "Thanh toán").await;
            return Ok(render_checkout(page, &data, &form, errors).into_response());
        }
    };

    tracing::info!(order_id = %order.id, method = %order.payment_method, "Order placed");
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));

    if order.payment_method == PaymentMethod::BankTransfer {
        return Ok(Redirect::to(&format!("/payment/{}", order.id)).into_response());
    }

    if let Err(e) = state.backend().clear_cart(&user.token).await {
        tracing::warn!(error = %e, order_id = %order.id, "Failed to clear cart after order");
    }
    let message = if order.is_installment {
        "Đã gửi hồ sơ trả góp, chúng tôi sẽ liên hệ trong 24 giờ"
    } else {
        "Đặt hàng thành công"
    };
    set_flash(&session, Flash::success(message)).await;
    Ok(Redirect::to(&format!("/account/orders/{}", order.id)).into_response())
}

/// VietQR code and countdown for a bank transfer order.
#[instrument(skip(state, session, user, nonce), fields(order_id = %id))]
pub async fn payment_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let order = state.backend().get_order(&user.token, &OrderId::new(id)).await?;
    let order_url = format!("/account/orders/{}", order.id);

    if order.payment_method != PaymentMethod::BankTransfer || order.is_paid || order.status.is_terminal() {
        return Ok(Redirect::to(&order_url).into_response());
    }

    let now = Utc::now();
    let config = state.config();
    let window = PaymentWindow::for_order(&order, config.payment_window, now);

    Ok(PaymentTemplate {
        page: PageContext::load(&session, Some(&user), nonce, "Chuyển khoản").await,
        order_id: order.id.to_string(),
        reference: order.reference(),
        amount: order.total_amount.display(),
        qr_url: qr_image_url(&config.vietqr, order.total_amount, &order),
        memo: transfer_memo(&order),
        bank_id: config.vietqr.bank_id.clone(),
        account_no: config.vietqr.account_no.clone(),
        account_name: config.vietqr.account_name.clone(),
        countdown: window.countdown(now),
        deadline: window.deadline().to_rfc3339(),
        expired: window.is_expired(now),
    }
    .into_response())
}

/// "I have paid": clear the cart and show the order as awaiting confirmation.
#[instrument(skip(state, session, user), fields(order_id = %id))]
pub async fn acknowledge(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let order = state.backend().get_order(&user.token, &OrderId::new(id)).await?;

    if let Err(e) = state.backend().clear_cart(&user.token).await {
        tracing::warn!(error = %e, order_id = %order.id, "Failed to clear cart after transfer");
    }

    tracing::info!(order_id = %order.id, "Shopper reported bank transfer");
    set_flash(
        &session,
        Flash::info(format!(
            "Đơn hàng {} đang chờ xác nhận thanh toán. Chúng tôi sẽ xác nhận ngay khi nhận được tiền.",
            order.reference()
        )),
    )
    .await;

    Ok(Redirect::to(&format!("/account/orders/{}", order.id)).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mobistore_core::AddressId;
    use mobistore_core::validation::InstallmentTerms;

    fn addresses() -> Vec<Address> {
        serde_json::from_value(serde_json::json!([
            { "_id": "a1", "fullName": "Nguyễn Văn An", "phone": "0912345678",
              "address": "12 Lý Thường Kiệt", "district": "Hoàn Kiếm", "city": "Hà Nội", "isDefault": true }
        ]))
        .unwrap()
    }

    fn cart() -> Cart {
        serde_json::from_value(serde_json::json!({
            "items": [{ "_id": "i1", "productId": "p1", "price": 12000000, "quantity": 1 }]
        }))
        .unwrap()
    }

    #[test]
    fn test_build_installment_order() {
        let checkout = ValidatedCheckout {
            address_id: AddressId::new("a1"),
            payment_method: PaymentMethod::Installment,
            installment: Some(InstallmentTerms {
                months: 6,
                down_payment_percent: 30,
            }),
            note: None,
        };

        let order = build_order(&checkout, &addresses(), &cart()).unwrap();
        assert_eq!(order.total_amount.dong(), 12_000_000);
        assert!(order.is_installment);
        assert_eq!(order.installment_months, Some(6));
        assert_eq!(order.shipping_address.full_name, "Nguyễn Văn An");
    }

    #[test]
    fn test_build_order_rejects_foreign_address() {
        let checkout = ValidatedCheckout {
            address_id: AddressId::new("someone-else"),
            payment_method: PaymentMethod::Cod,
            installment: None,
            note: None,
        };
        let errors = build_order(&checkout, &addresses(), &cart()).unwrap_err();
        assert!(errors.has("address_id"));
    }

    #[test]
    fn test_installment_rows_cover_every_term() {
        let rows = installment_rows(Money::from_dong(12_000_000), 30, Some(6));
        assert_eq!(rows.len(), INSTALLMENT_TERMS.len());
        let six = rows.iter().find(|r| r.months == 6).unwrap();
        assert!(six.selected);
        assert_eq!(six.down_payment, "3.600.000 ₫");
        assert_eq!(six.monthly, "1.400.000 ₫");
    }
}
