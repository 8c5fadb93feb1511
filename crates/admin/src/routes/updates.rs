//! Order status and installment review updates.
//!
//! The buttons offered follow [`OrderStatus::next_statuses`]; the same rule
//! is checked again on submit before anything is sent to the backend,
//! which remains the authority.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::{FinanceStatus, OrderId, OrderStatus};

use super::views::{FilterTab, InstallmentRowView, OrderRowView};
use super::{PageContext, set_flash};
use crate::backend::BackendError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::Flash;
use crate::state::AppState;

// =============================================================================
// Query and form types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FinanceFilter {
    #[serde(rename = "financeStatus")]
    pub finance_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    /// `approve` or `reject`.
    pub decision: String,
}

/// Parse an optional filter value; blank or unknown means "all".
fn parse_filter<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

fn order_tabs(selected: Option<OrderStatus>) -> Vec<FilterTab> {
    std::iter::once(FilterTab {
        href: "/updates".to_string(),
        label: "Tất cả".to_string(),
        selected: selected.is_none(),
    })
    .chain(OrderStatus::ALL.iter().map(|status| FilterTab {
        href: format!("/updates?status={status}"),
        label: status.label().to_string(),
        selected: selected == Some(*status),
    }))
    .collect()
}

fn finance_tabs(selected: Option<FinanceStatus>) -> Vec<FilterTab> {
    const ALL: [FinanceStatus; 3] = [
        FinanceStatus::Pending,
        FinanceStatus::Approved,
        FinanceStatus::Rejected,
    ];
    std::iter::once(FilterTab {
        href: "/updates/installments".to_string(),
        label: "Tất cả".to_string(),
        selected: selected.is_none(),
    })
    .chain(ALL.iter().map(|status| FilterTab {
        href: format!("/updates/installments?financeStatus={status}"),
        label: status.label().to_string(),
        selected: selected == Some(*status),
    }))
    .collect()
}

/// Decision button value to the status it sets.
fn decision_status(decision: &str) -> Option<FinanceStatus> {
    match decision {
        "approve" => Some(FinanceStatus::Approved),
        "reject" => Some(FinanceStatus::Rejected),
        _ => None,
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "updates/orders.html")]
pub struct OrderUpdatesTemplate {
    pub page: PageContext,
    pub tabs: Vec<FilterTab>,
    pub orders: Vec<OrderRowView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "updates/installments.html")]
pub struct InstallmentUpdatesTemplate {
    pub page: PageContext,
    pub tabs: Vec<FilterTab>,
    pub applications: Vec<InstallmentRowView>,
}

/// Flash the backend's reason for a client-side rejection, or propagate.
async fn flash_rejection(session: &Session, err: BackendError) -> Result<()> {
    let Some(message) = err.user_message().map(str::to_owned) else {
        return Err(err.into());
    };
    set_flash(session, Flash::error(message)).await;
    Ok(())
}

// =============================================================================
// Orders
// =============================================================================

/// Orders, optionally filtered by status, newest first.
#[instrument(skip(state, session, admin))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse> {
    let status = parse_filter::<OrderStatus>(filter.status.as_deref());
    let mut orders = state.backend().admin_orders(&admin.token, status).await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(OrderUpdatesTemplate {
        page: PageContext::load(&session, &admin, "/updates", "Cập nhật đơn hàng").await,
        tabs: order_tabs(status),
        orders: orders.iter().map(OrderRowView::from).collect(),
    })
}

/// Move an order to the submitted status.
///
/// The current status is re-read so a stale page cannot skip a step.
#[instrument(skip(state, session, admin, form), fields(order_id = %id, status = %form.status))]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let next: OrderStatus = form
        .status
        .parse()
        .map_err(|_| AppError::BadRequest("Trạng thái không hợp lệ".to_string()))?;
    let order_id = OrderId::new(id);
    let backend = state.backend();

    let current = backend
        .admin_orders(&admin.token, None)
        .await?
        .into_iter()
        .find(|o| o.id == order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    if !current.status.can_transition_to(next) {
        tracing::warn!(from = %current.status, to = %next, "Rejected status transition");
        set_flash(
            &session,
            Flash::error(format!(
                "Không thể chuyển đơn {} từ \"{}\" sang \"{}\"",
                current.reference(),
                current.status.label(),
                next.label()
            )),
        )
        .await;
        return Ok(Redirect::to("/updates"));
    }

    match backend.update_order_status(&admin.token, &order_id, next).await {
        Ok(_) => {
            tracing::info!(from = %current.status, to = %next, "Order status updated");
            set_flash(
                &session,
                Flash::success(format!(
                    "Đơn {} đã chuyển sang \"{}\"",
                    current.reference(),
                    next.label()
                )),
            )
            .await;
        }
        Err(e) => flash_rejection(&session, e).await?,
    }
    Ok(Redirect::to("/updates"))
}

// =============================================================================
// Installments
// =============================================================================

/// Installment applications, optionally filtered by review state.
#[instrument(skip(state, session, admin))]
pub async fn installments(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Query(filter): Query<FinanceFilter>,
) -> Result<impl IntoResponse> {
    let finance = parse_filter::<FinanceStatus>(filter.finance_status.as_deref());
    let mut orders = state
        .backend()
        .installment_orders(&admin.token, finance)
        .await?;
    orders.retain(|o| o.is_installment);
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(InstallmentUpdatesTemplate {
        page: PageContext::load(&session, &admin, "/updates/installments", "Duyệt trả góp").await,
        tabs: finance_tabs(finance),
        applications: orders.iter().map(InstallmentRowView::from).collect(),
    })
}

/// Approve or reject a pending application.
#[instrument(skip(state, session, admin, form), fields(order_id = %id, decision = %form.decision))]
pub async fn review_installment(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect> {
    const BACK: &str = "/updates/installments";

    let decision = decision_status(&form.decision)
        .ok_or_else(|| AppError::BadRequest("Quyết định không hợp lệ".to_string()))?;
    let order_id = OrderId::new(id);
    let backend = state.backend();

    let application = backend
        .installment_orders(&admin.token, None)
        .await?
        .into_iter()
        .find(|o| o.id == order_id)
        .ok_or_else(|| AppError::NotFound(format!("installment {order_id}")))?;

    let finance = application.finance_status.unwrap_or_default();
    if finance != FinanceStatus::Pending {
        set_flash(
            &session,
            Flash::error(format!(
                "Hồ sơ {} đã được xử lý ({})",
                application.reference(),
                finance.label()
            )),
        )
        .await;
        return Ok(Redirect::to(BACK));
    }

    match backend
        .update_finance_status(&admin.token, &order_id, decision)
        .await
    {
        Ok(_) => {
            tracing::info!(finance_status = %decision, "Installment reviewed");
            set_flash(
                &session,
                Flash::success(format!(
                    "Hồ sơ {}: {}",
                    application.reference(),
                    decision.label()
                )),
            )
            .await;
        }
        Err(e) => flash_rejection(&session, e).await?,
    }
    Ok(Redirect::to(BACK))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter::<OrderStatus>(Some("shipping")), Some(OrderStatus::Shipping));
        assert_eq!(parse_filter::<OrderStatus>(Some("")), None);
        assert_eq!(parse_filter::<OrderStatus>(Some("lost")), None);
        assert_eq!(parse_filter::<FinanceStatus>(None), None);
    }

    #[test]
    fn test_order_tabs_mark_selection() {
        let tabs = order_tabs(Some(OrderStatus::Delivered));
        assert_eq!(tabs.len(), 6);
        assert!(!tabs[0].selected);
        let selected: Vec<_> = tabs.iter().filter(|t| t.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].href, "/updates?status=delivered");
    }

    #[test]
    fn test_finance_tabs_all_selected_by_default() {
        let tabs = finance_tabs(None);
        assert!(tabs[0].selected);
        assert_eq!(tabs[1].href, "/updates/installments?financeStatus=pending");
    }

    #[test]
    fn test_decision_status() {
        assert_eq!(decision_status("approve"), Some(FinanceStatus::Approved));
        assert_eq!(decision_status("reject"), Some(FinanceStatus::Rejected));
        assert_eq!(decision_status("maybe"), None);
    }
}
