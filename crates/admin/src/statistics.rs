//! Reshaping of analytics responses into cards and Chart.js data.
//!
//! Everything here is pure: handlers fetch, these functions shape. When an
//! analytics endpoint is unavailable the raw order and customer lists are
//! aggregated instead ([`monthly_buckets`], [`month_over_month`],
//! [`fallback_summary`]).

#![allow(clippy::cast_precision_loss)] // VND totals stay far below 2^52

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::Serialize;

use mobistore_core::{Money, OrderStatus};

use crate::backend::{
    CustomerGrowthPoint, DashboardSummary, Growth, Order, RevenuePoint, StatusCount, TopProduct,
    User,
};

/// Vietnam is UTC+7 all year round.
const VN_OFFSET_SECS: i32 = 7 * 3600;

const REVENUE_COLOR: &str = "#2563eb";
const ORDERS_COLOR: &str = "#f59e0b";
const CUSTOMERS_COLOR: &str = "#10b981";
const TOP_PRODUCT_COLOR: &str = "#6366f1";

// =============================================================================
// Chart.js payload
// =============================================================================

/// One color for the whole dataset or one per data point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartColor {
    One(&'static str),
    Many(Vec<&'static str>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<ChartColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<ChartColor>,
    /// Secondary axis, for series on a different scale.
    #[serde(rename = "yAxisID", skip_serializing_if = "Option::is_none")]
    pub y_axis_id: Option<&'static str>,
}

impl Dataset {
    fn new(label: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            data,
            background_color: None,
            border_color: None,
            y_axis_id: None,
        }
    }

    fn colored(mut self, color: &'static str) -> Self {
        self.background_color = Some(ChartColor::One(color));
        self.border_color = Some(ChartColor::One(color));
        self
    }
}

/// The `data` object of a Chart.js config.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() || self.datasets.iter().all(|d| d.data.iter().all(|v| *v == 0.0))
    }

    /// JSON for a `<script type="application/json">` block.
    ///
    /// `<` is escaped so a label can never close the script element.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| "{}".to_string())
            .replace('<', "\\u003c")
    }
}

fn dong(money: Money) -> f64 {
    money.dong() as f64
}

/// Revenue line with the order count on a second axis.
#[must_use]
pub fn revenue_chart(series: &[RevenuePoint]) -> ChartData {
    let mut orders = Dataset::new(
        "Đơn hàng",
        series.iter().map(|p| p.orders as f64).collect(),
    )
    .colored(ORDERS_COLOR);
    orders.y_axis_id = Some("orders");

    ChartData {
        labels: series.iter().map(|p| p.label.clone()).collect(),
        datasets: vec![
            Dataset::new(
                "Doanh thu (₫)",
                series.iter().map(|p| dong(p.revenue)).collect(),
            )
            .colored(REVENUE_COLOR),
            orders,
        ],
    }
}

fn status_color(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "#f59e0b",
        OrderStatus::Confirmed => "#3b82f6",
        OrderStatus::Shipping => "#8b5cf6",
        OrderStatus::Delivered => "#10b981",
        OrderStatus::Cancelled => "#ef4444",
    }
}

/// Doughnut of orders per status, always in lifecycle order.
///
/// Statuses the backend did not report count as zero; unknown names are
/// ignored and repeated names are summed.
#[must_use]
pub fn status_chart(counts: &[StatusCount]) -> ChartData {
    let mut totals = [0u64; OrderStatus::ALL.len()];
    for row in counts {
        match row.status.trim().to_lowercase().parse::<OrderStatus>() {
            Ok(status) => {
                if let Some(total) = OrderStatus::ALL
                    .iter()
                    .position(|s| *s == status)
                    .and_then(|index| totals.get_mut(index))
                {
                    *total = total.saturating_add(row.count);
                }
            }
            Err(_) => tracing::debug!(status = %row.status, "Ignoring unknown order status"),
        }
    }

    let colors: Vec<&'static str> = OrderStatus::ALL.iter().map(|s| status_color(*s)).collect();
    let mut dataset = Dataset::new("Đơn hàng", totals.iter().map(|c| *c as f64).collect());
    dataset.background_color = Some(ChartColor::Many(colors));

    ChartData {
        labels: OrderStatus::ALL.iter().map(|s| s.label().to_string()).collect(),
        datasets: vec![dataset],
    }
}

/// Bar chart of units sold, in the order the backend ranked them.
#[must_use]
pub fn top_products_chart(products: &[TopProduct]) -> ChartData {
    ChartData {
        labels: products.iter().map(|p| p.name.clone()).collect(),
        datasets: vec![
            Dataset::new("Đã bán", products.iter().map(|p| p.sold as f64).collect())
                .colored(TOP_PRODUCT_COLOR),
        ],
    }
}

/// New customers per month.
#[must_use]
pub fn customer_chart(points: &[CustomerGrowthPoint]) -> ChartData {
    ChartData {
        labels: points.iter().map(|p| p.label.clone()).collect(),
        datasets: vec![
            Dataset::new(
                "Khách hàng mới",
                points.iter().map(|p| p.customers as f64).collect(),
            )
            .colored(CUSTOMERS_COLOR),
        ],
    }
}

// =============================================================================
// Fallback aggregation
// =============================================================================

fn vn_time(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    match FixedOffset::east_opt(VN_OFFSET_SECS) {
        Some(offset) => at.with_timezone(&offset),
        None => at.fixed_offset(),
    }
}

fn counts_as_revenue(order: &Order) -> bool {
    order.status != OrderStatus::Cancelled
}

/// Twelve monthly points ("T1" … "T12") for `year`, from raw orders.
///
/// Revenue excludes cancelled orders; the order count includes every order.
/// Months are taken in Vietnam time; undated orders are skipped.
#[must_use]
pub fn monthly_buckets(orders: &[Order], year: i32) -> Vec<RevenuePoint> {
    let mut buckets: Vec<RevenuePoint> = (1..=12)
        .map(|month| RevenuePoint {
            label: format!("T{month}"),
            revenue: Money::ZERO,
            orders: 0,
        })
        .collect();

    for order in orders {
        let Some(at) = order.created_at.map(vn_time) else {
            continue;
        };
        if at.year() != year {
            continue;
        }
        let Some(bucket) = buckets.get_mut(at.month0() as usize) else {
            continue;
        };
        bucket.orders += 1;
        if counts_as_revenue(order) {
            bucket.revenue = bucket.revenue + order.total_amount;
        }
    }

    buckets
}

/// `(current − previous) / previous × 100`, rounded to one decimal.
///
/// Undefined growth from zero is reported as `None` when nothing changed and
/// as `Some(100.0)` otherwise.
#[must_use]
pub fn growth_percent(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return (current != 0.0).then_some(100.0);
    }
    let percent = (current - previous) / previous * 100.0;
    Some((percent * 10.0).round() / 10.0)
}

/// `(year, month)` of the calendar month before `(year, month)`.
const fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn in_month(at: Option<DateTime<Utc>>, (year, month): (i32, u32)) -> bool {
    at.map(vn_time)
        .is_some_and(|at| at.year() == year && at.month() == month)
}

/// Growth of the current calendar month over the previous one.
#[must_use]
pub fn month_over_month(orders: &[Order], customers: &[User], now: DateTime<Utc>) -> Growth {
    let now = vn_time(now);
    let current = (now.year(), now.month());
    let previous = previous_month(current.0, current.1);

    let revenue_in = |month| -> f64 {
        orders
            .iter()
            .filter(|o| counts_as_revenue(o) && in_month(o.created_at, month))
            .map(|o| dong(o.total_amount))
            .sum()
    };
    let orders_in =
        |month| orders.iter().filter(|o| in_month(o.created_at, month)).count() as f64;
    let customers_in =
        |month| customers.iter().filter(|c| in_month(c.created_at, month)).count() as f64;

    Growth {
        revenue: growth_percent(revenue_in(current), revenue_in(previous)),
        orders: growth_percent(orders_in(current), orders_in(previous)),
        customers: growth_percent(customers_in(current), customers_in(previous)),
    }
}

/// Totals computed from raw lists when `/dashboard/summary` is unavailable.
#[must_use]
pub fn fallback_summary(orders: &[Order], customers: &[User]) -> DashboardSummary {
    DashboardSummary {
        total_revenue: orders
            .iter()
            .filter(|o| counts_as_revenue(o))
            .map(|o| o.total_amount)
            .sum(),
        total_orders: orders.len() as u64,
        total_customers: customers.len() as u64,
        total_products: 0,
        pending_orders: orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count() as u64,
    }
}

// =============================================================================
// Summary cards
// =============================================================================

/// A headline number on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryCard {
    pub label: &'static str,
    pub value: String,
    /// Signed percentage, empty when there is no comparison.
    pub growth: String,
    /// `up`, `down` or `flat`, used as a CSS class.
    pub trend: &'static str,
}

impl SummaryCard {
    fn new(label: &'static str, value: String, growth: Option<f64>) -> Self {
        let (growth, trend) = match growth {
            Some(g) if g > 0.0 => (format!("+{g:.1}%"), "up"),
            Some(g) if g < 0.0 => (format!("{g:.1}%"), "down"),
            Some(_) => ("0.0%".to_string(), "flat"),
            None => (String::new(), "flat"),
        };
        Self {
            label,
            value,
            growth,
            trend,
        }
    }
}

/// Dashboard cards: revenue, orders, customers, products, pending orders.
#[must_use]
pub fn summary_cards(summary: &DashboardSummary, growth: &Growth) -> Vec<SummaryCard> {
    vec![
        SummaryCard::new("Doanh thu", summary.total_revenue.display(), growth.revenue),
        SummaryCard::new("Đơn hàng", summary.total_orders.to_string(), growth.orders),
        SummaryCard::new(
            "Khách hàng",
            summary.total_customers.to_string(),
            growth.customers,
        ),
        SummaryCard::new("Sản phẩm", summary.total_products.to_string(), None),
        SummaryCard::new("Chờ xác nhận", summary.pending_orders.to_string(), None),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn order(total: u64, status: &str, created_at: &str) -> Order {
        serde_json::from_value(serde_json::json!({
            "_id": format!("o-{created_at}-{status}"),
            "totalAmount": total,
            "status": status,
            "createdAt": created_at
        }))
        .unwrap()
    }

    fn customer(created_at: &str) -> User {
        serde_json::from_value(serde_json::json!({
            "_id": format!("u-{created_at}"),
            "createdAt": created_at
        }))
        .unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_growth_percent() {
        assert_eq!(growth_percent(150.0, 100.0), Some(50.0));
        assert_eq!(growth_percent(2.0, 3.0), Some(-33.3));
        assert_eq!(growth_percent(0.0, 0.0), None);
        assert_eq!(growth_percent(5.0, 0.0), Some(100.0));
    }

    #[test]
    fn test_monthly_buckets_excludes_cancelled_revenue() {
        let orders = vec![
            order(1_000_000, "delivered", "2026-03-10T05:00:00Z"),
            order(2_000_000, "cancelled", "2026-03-11T05:00:00Z"),
            order(500_000, "pending", "2025-03-11T05:00:00Z"),
        ];
        let buckets = monthly_buckets(&orders, 2026);
        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[2].label, "T3");
        assert_eq!(buckets[2].orders, 2);
        assert_eq!(buckets[2].revenue.dong(), 1_000_000);
        assert_eq!(buckets[0].orders, 0);
    }

    #[test]
    fn test_monthly_buckets_use_vietnam_time() {
        // 31 Jan 20:00 UTC is already 1 Feb in Hanoi
        let orders = vec![order(100, "delivered", "2026-01-31T20:00:00Z")];
        let buckets = monthly_buckets(&orders, 2026);
        assert_eq!(buckets[0].orders, 0);
        assert_eq!(buckets[1].orders, 1);
    }

    #[test]
    fn test_month_over_month_wraps_year() {
        let orders = vec![
            order(300, "delivered", "2026-01-05T03:00:00Z"),
            order(200, "delivered", "2025-12-20T03:00:00Z"),
        ];
        let customers = vec![customer("2026-01-02T03:00:00Z")];
        let growth = month_over_month(&orders, &customers, at("2026-01-15T00:00:00Z"));
        assert_eq!(growth.revenue, Some(50.0));
        assert_eq!(growth.orders, Some(0.0));
        assert_eq!(growth.customers, Some(100.0));
    }

    #[test]
    fn test_status_chart_fixed_order() {
        let counts = vec![
            StatusCount {
                status: "delivered".into(),
                count: 4,
            },
            StatusCount {
                status: "refunded".into(),
                count: 9,
            },
            StatusCount {
                status: "Pending".into(),
                count: 1,
            },
        ];
        let chart = status_chart(&counts);
        assert_eq!(chart.labels[0], OrderStatus::Pending.label());
        assert_eq!(chart.datasets[0].data, vec![1.0, 0.0, 0.0, 4.0, 0.0]);
        assert!(matches!(
            &chart.datasets[0].background_color,
            Some(ChartColor::Many(colors)) if colors.len() == 5
        ));
    }

    #[test]
    fn test_status_chart_saturates_repeated_counts() {
        let counts = vec![
            StatusCount {
                status: "pending".into(),
                count: u64::MAX,
            },
            StatusCount {
                status: "pending".into(),
                count: 5,
            },
        ];
        let chart = status_chart(&counts);
        assert_eq!(chart.datasets[0].data[0], u64::MAX as f64);
    }

    #[test]
    fn test_revenue_chart_json_shape() {
        let chart = revenue_chart(&[RevenuePoint {
            label: "T1".into(),
            revenue: Money::from_dong(1_500_000),
            orders: 3,
        }]);
        let json: serde_json::Value = serde_json::from_str(&chart.to_json()).unwrap();
        assert_eq!(json["labels"][0], "T1");
        assert_eq!(json["datasets"][0]["data"][0], 1_500_000.0);
        assert_eq!(json["datasets"][0]["backgroundColor"], REVENUE_COLOR);
        assert_eq!(json["datasets"][1]["yAxisID"], "orders");
        assert!(json["datasets"][0].get("yAxisID").is_none());
    }

    #[test]
    fn test_to_json_escapes_script_close() {
        let chart = top_products_chart(&[TopProduct {
            name: "</script><b>".into(),
            sold: 1,
            revenue: Money::ZERO,
        }]);
        assert!(!chart.to_json().contains("</script>"));
    }

    #[test]
    fn test_empty_chart() {
        assert!(ChartData::default().is_empty());
        assert!(customer_chart(&[]).is_empty());
    }

    #[test]
    fn test_fallback_summary() {
        let orders = vec![
            order(1_000, "pending", "2026-02-01T00:00:00Z"),
            order(9_000, "cancelled", "2026-02-01T00:00:00Z"),
        ];
        let summary = fallback_summary(&orders, &[customer("2026-01-01T00:00:00Z")]);
        assert_eq!(summary.total_revenue.dong(), 1_000);
        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.pending_orders, 1);
        assert_eq!(summary.total_customers, 1);
    }

    #[test]
    fn test_summary_cards_trend() {
        let cards = summary_cards(
            &DashboardSummary::default(),
            &Growth {
                revenue: Some(12.5),
                orders: Some(-3.0),
                customers: None,
            },
        );
        assert_eq!(cards[0].growth, "+12.5%");
        assert_eq!(cards[0].trend, "up");
        assert_eq!(cards[1].trend, "down");
        assert_eq!(cards[2].growth, "");
    }
}
