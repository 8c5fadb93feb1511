//! Order history, order detail and installment applications.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::pricing::installment_plan;
use mobistore_core::{FinanceStatus, OrderId, PaymentMethod};

use super::views::{OrderItemView, OrderSummaryView, format_datetime, status_class};
use super::{PageContext, set_flash};
use crate::backend::Order;
use crate::error::Result;
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::models::{CurrentUser, Flash};
use crate::state::AppState;

#[derive(Clone)]
pub struct OrderDetailView {
    pub id: String,
    pub reference: String,
    pub created_at: String,
    pub status: String,
    pub status_class: &'static str,
    pub payment_method: &'static str,
    pub paid: bool,
    pub total: String,
    pub items: Vec<OrderItemView>,
    pub recipient: String,
    pub phone: String,
    pub address: String,
    pub cancellable: bool,
    /// Whether the transfer QR page is still relevant.
    pub awaiting_transfer: bool,
    pub installment: Option<InstallmentView>,
}

impl From<&Order> for OrderDetailView {
    fn from(order: &Order) -> Self {
        let shipping = order.shipping_address.clone().unwrap_or_default();
        Self {
            id: order.id.to_string(),
            reference: order.reference(),
            created_at: format_datetime(order.created_at),
            status: order.status.label().to_string(),
            status_class: status_class(order.status),
            payment_method: order.payment_method.label(),
            paid: order.is_paid,
            total: order.total_amount.display(),
            items: order.items.iter().map(OrderItemView::from).collect(),
            recipient: shipping.full_name.clone(),
            phone: shipping.phone.clone(),
            address: shipping.one_line(),
            cancellable: order.status.is_cancellable(),
            awaiting_transfer: order.payment_method == PaymentMethod::BankTransfer
                && !order.is_paid
                && !order.status.is_terminal(),
            installment: InstallmentView::for_order(order),
        }
    }
}

/// Installment terms and review state of an order.
#[derive(Clone)]
pub struct InstallmentView {
    pub order_id: String,
    pub reference: String,
    pub created_at: String,
    pub total: String,
    pub months: u32,
    pub down_payment_percent: u32,
    pub down_payment: String,
    pub monthly: String,
    pub finance_status: &'static str,
    pub finance_class: &'static str,
}

impl InstallmentView {
    fn for_order(order: &Order) -> Option<Self> {
        if !order.is_installment {
            return None;
        }
        let months = order.installment_months.unwrap_or(0);
        let down = order.down_payment_percent.unwrap_or(0);
        let plan = installment_plan(order.total_amount, months, down).ok();
        let finance = order.finance_status.unwrap_or_default();

        Some(Self {
            order_id: order.id.to_string(),
            reference: order.reference(),
            created_at: format_datetime(order.created_at),
            total: order.total_amount.display(),
            months,
            down_payment_percent: down,
            down_payment: plan.map(|p| p.down_payment.display()).unwrap_or_default(),
            monthly: plan.map(|p| p.monthly.display()).unwrap_or_default(),
            finance_status: finance.label(),
            finance_class: match finance {
                FinanceStatus::Pending => "badge-warning",
                FinanceStatus::Approved => "badge-success",
                FinanceStatus::Rejected => "badge-error",
            },
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderSummaryView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: PageContext,
    pub order: OrderDetailView,
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/installments.html")]
pub struct InstallmentsTemplate {
    pub page: PageContext,
    pub applications: Vec<InstallmentView>,
}

async fn page(session: &Session, user: &CurrentUser, nonce: String, title: &str) -> PageContext {
    PageContext::load(session, Some(user), nonce, title).await
}

/// Order history, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let mut orders = state.backend().my_orders(&user.token).await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(OrdersTemplate {
        page: page(&session, &user, nonce, "Đơn hàng của tôi").await,
        orders: orders.iter().map(OrderSummaryView::from).collect(),
    })
}

/// Order detail.
#[instrument(skip(state, session, user, nonce), fields(order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = state.backend().get_order(&user.token, &OrderId::new(id)).await?;
    let title = format!("Đơn hàng {}", order.reference());

    Ok(OrderShowTemplate {
        page: page(&session, &user, nonce, &title).await,
        order: OrderDetailView::from(&order),
    })
}

/// Cancel an order while it is still pending.
#[instrument(skip(state, session, user), fields(order_id = %id))]
pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let order_id = OrderId::new(id);
    let back = format!("/account/orders/{order_id}");
    let backend = state.backend();

    let order = backend.get_order(&user.token, &order_id).await?;
    if !order.status.is_cancellable() {
        set_flash(
            &session,
            Flash::error(format!(
                "Không thể hủy đơn hàng ở trạng thái \"{}\"",
                order.status.label()
            )),
        )
        .await;
        return Ok(Redirect::to(&back));
    }

    match backend.cancel_order(&user.token, &order_id).await {
        Ok(_) => {
            tracing::info!(order_id = %order_id, "Order cancelled by customer");
            set_flash(&session, Flash::success("Đã hủy đơn hàng")).await;
        }
        Err(e) => {
            let Some(message) = e.user_message().map(str::to_owned) else {
                return Err(e.into());
            };
            set_flash(&session, Flash::error(message)).await;
        }
    }
    Ok(Redirect::to(&back))
}

/// Installment applications and their review state.
#[instrument(skip_all)]
pub async fn installments(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let mut orders = state.backend().installment_orders(&user.token).await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(InstallmentsTemplate {
        page: page(&session, &user, nonce, "Hồ sơ trả góp").await,
        applications: orders.iter().filter_map(InstallmentView::for_order).collect(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(json: serde_json::Value) -> Order {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_detail_of_pending_transfer() {
        let order = order(serde_json::json!({
            "_id": "o1",
            "orderCode": "MS77",
            "totalAmount": 9990000,
            "status": "pending",
            "paymentMethod": "bank_transfer",
            "shippingAddress": { "fullName": "Trần B", "phone": "0987654321", "address": "5 Lê Lợi", "city": "Huế" }
        }));
        let view = OrderDetailView::from(&order);
        assert!(view.cancellable);
        assert!(view.awaiting_transfer);
        assert_eq!(view.address, "5 Lê Lợi, Huế");
        assert!(view.installment.is_none());
    }

    #[test]
    fn test_installment_view() {
        let order = order(serde_json::json!({
            "_id": "o2",
            "totalAmount": 12000000,
            "status": "confirmed",
            "paymentMethod": "installment",
            "isInstallment": true,
            "installmentMonths": 12,
            "downPaymentPercent": 0,
            "financeStatus": "approved"
        }));
        let view = InstallmentView::for_order(&order).unwrap();
        assert_eq!(view.monthly, "1.000.000 ₫");
        assert_eq!(view.finance_status, "Đã duyệt");
        assert!(!OrderDetailView::from(&order).cancellable);
    }
}
