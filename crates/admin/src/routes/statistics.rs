//! Statistics page: revenue, order status, best sellers and customer charts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Datelike;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::PageContext;
use super::views::FilterTab;
use crate::backend::BackendError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;
use crate::statistics::{
    ChartData, SummaryCard, customer_chart, fallback_summary, month_over_month, monthly_buckets,
    revenue_chart, status_chart, summary_cards, top_products_chart,
};

const TOP_PRODUCTS: u32 = 10;
/// Years offered in the selector, counting back from the current one.
const YEARS_SHOWN: i32 = 4;

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    pub year: Option<i32>,
}

/// A chart and the id of its `<canvas>`.
pub struct ChartView {
    pub id: &'static str,
    pub title: &'static str,
    /// Chart.js type: `line`, `bar` or `doughnut`.
    pub kind: &'static str,
    pub json: String,
    pub empty: bool,
}

impl ChartView {
    fn new(id: &'static str, title: &'static str, kind: &'static str, data: &ChartData) -> Self {
        Self {
            id,
            title,
            kind,
            json: data.to_json(),
            empty: data.is_empty(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "statistics.html")]
pub struct StatisticsTemplate {
    pub page: PageContext,
    pub year: i32,
    pub years: Vec<FilterTab>,
    pub cards: Vec<SummaryCard>,
    pub charts: Vec<ChartView>,
}

fn or_empty<T: Default>(result: Result<T, BackendError>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, source = what, "Analytics read failed, showing empty");
        T::default()
    })
}

/// Charts for one year.
///
/// Seven reads run in parallel and each degrades to empty on failure. The
/// revenue series falls back to bucketing raw orders when the analytics
/// endpoint returns nothing.
#[instrument(skip(state, session, admin), fields(admin_id = %admin.id))]
pub async fn statistics(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<StatisticsQuery>,
) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let this_year = now.year();
    let year = query
        .year
        .filter(|y| (this_year - YEARS_SHOWN + 1..=this_year).contains(y))
        .unwrap_or(this_year);

    let backend = state.backend();
    let token = admin.token.as_str();
    let (revenue, status, top, customer_growth, growth, orders, customers) = tokio::join!(
        backend.revenue_by_month(token, year),
        backend.order_status_breakdown(token),
        backend.top_products(token, TOP_PRODUCTS),
        backend.customer_growth(token),
        backend.growth(token),
        backend.all_orders(token),
        backend.all_customers(token),
    );

    let orders = or_empty(orders, "orders");
    let customers = or_empty(customers, "customers");
    let mut revenue = or_empty(revenue, "revenue");
    if revenue.is_empty() {
        revenue = monthly_buckets(&orders, year);
    }
    let growth = growth.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Growth endpoint unavailable, computing locally");
        month_over_month(&orders, &customers, now)
    });

    let charts = vec![
        ChartView::new("revenue-chart", "Doanh thu theo tháng", "line", &revenue_chart(&revenue)),
        ChartView::new(
            "status-chart",
            "Trạng thái đơn hàng",
            "doughnut",
            &status_chart(&or_empty(status, "order-status")),
        ),
        ChartView::new(
            "top-products-chart",
            "Sản phẩm bán chạy",
            "bar",
            &top_products_chart(&or_empty(top, "top-products")),
        ),
        ChartView::new(
            "customers-chart",
            "Khách hàng mới",
            "line",
            &customer_chart(&or_empty(customer_growth, "customer-growth")),
        ),
    ];

    let years = (0..YEARS_SHOWN)
        .map(|back| this_year - back)
        .map(|y| FilterTab {
            href: format!("/statistics?year={y}"),
            label: y.to_string(),
            selected: y == year,
        })
        .collect();

    StatisticsTemplate {
        page: PageContext::load(&session, &admin, "/statistics", "Thống kê").await,
        year,
        years,
        cards: summary_cards(&fallback_summary(&orders, &customers), &growth),
        charts,
    }
}
