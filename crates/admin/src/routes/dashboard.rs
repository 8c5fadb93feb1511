//! Dashboard: headline numbers and month-over-month growth.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use super::PageContext;
use super::views::OrderRowView;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;
use crate::statistics::{SummaryCard, fallback_summary, month_over_month, summary_cards};

/// Orders shown under the cards.
const RECENT_ORDERS: usize = 8;

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub cards: Vec<SummaryCard>,
    pub recent_orders: Vec<OrderRowView>,
    /// Set when the counters were computed locally.
    pub degraded: bool,
}

/// Dashboard page.
///
/// The summary and growth endpoints are preferred; when either fails the
/// numbers are rebuilt from the full order and customer lists.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
) -> impl IntoResponse {
    let backend = state.backend();
    let token = admin.token.as_str();

    let (summary, growth, orders, customers) = tokio::join!(
        backend.dashboard_summary(token),
        backend.growth(token),
        backend.all_orders(token),
        backend.all_customers(token),
    );

    let mut orders = orders.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load orders");
        Vec::new()
    });
    let customers = customers.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load customers");
        Vec::new()
    });

    let mut degraded = false;
    let summary = summary.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Dashboard summary unavailable, aggregating locally");
        degraded = true;
        fallback_summary(&orders, &customers)
    });
    let growth = growth.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Growth endpoint unavailable, computing locally");
        month_over_month(&orders, &customers, chrono::Utc::now())
    });

    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    DashboardTemplate {
        page: PageContext::load(&session, &admin, "/", "Tổng quan").await,
        cards: summary_cards(&summary, &growth),
        recent_orders: orders.iter().take(RECENT_ORDERS).map(OrderRowView::from).collect(),
        degraded,
    }
}
