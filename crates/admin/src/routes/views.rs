//! Display types for admin tables.
//!
//! Money, dates and labels are rendered here so templates only see strings.

use chrono::{DateTime, FixedOffset, Utc};

use mobistore_core::pricing::installment_plan;
use mobistore_core::{FinanceStatus, OrderStatus};

use crate::backend::{News, Order};

const VN_OFFSET_SECS: i32 = 7 * 3600;

/// `dd/mm/yyyy HH:MM` in Vietnam time.
#[must_use]
pub fn format_datetime(at: Option<DateTime<Utc>>) -> String {
    let Some(at) = at else {
        return String::new();
    };
    match FixedOffset::east_opt(VN_OFFSET_SECS) {
        Some(offset) => at.with_timezone(&offset).format("%d/%m/%Y %H:%M").to_string(),
        None => at.format("%d/%m/%Y %H:%M").to_string(),
    }
}

#[must_use]
pub const fn status_class(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "badge-warning",
        OrderStatus::Confirmed => "badge-info",
        OrderStatus::Shipping => "badge-primary",
        OrderStatus::Delivered => "badge-success",
        OrderStatus::Cancelled => "badge-muted",
    }
}

#[must_use]
pub const fn finance_class(status: FinanceStatus) -> &'static str {
    match status {
        FinanceStatus::Pending => "badge-warning",
        FinanceStatus::Approved => "badge-success",
        FinanceStatus::Rejected => "badge-error",
    }
}

/// A filter link above a table.
#[derive(Clone)]
pub struct FilterTab {
    pub href: String,
    pub label: String,
    pub selected: bool,
}

/// A status the order may move to next.
#[derive(Clone, Copy)]
pub struct NextStatus {
    pub value: &'static str,
    pub label: &'static str,
    /// Rendered as a destructive button with a confirmation.
    pub destructive: bool,
}

/// Row of the order updates table.
#[derive(Clone)]
pub struct OrderRowView {
    pub id: String,
    pub reference: String,
    pub customer: String,
    pub phone: String,
    pub created_at: String,
    pub total: String,
    pub items: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub payment_method: &'static str,
    pub paid: bool,
    pub next: Vec<NextStatus>,
}

impl From<&Order> for OrderRowView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            reference: order.reference(),
            customer: order.customer_name(),
            phone: order
                .shipping_address
                .as_ref()
                .map(|a| a.phone.clone())
                .unwrap_or_default(),
            created_at: format_datetime(order.created_at),
            total: order.total_amount.display(),
            items: order
                .items
                .iter()
                .map(|line| format!("{} × {}", line.name, line.quantity))
                .collect::<Vec<_>>()
                .join(", "),
            status: order.status.label(),
            status_class: status_class(order.status),
            payment_method: order.payment_method.label(),
            paid: order.is_paid,
            next: order
                .status
                .next_statuses()
                .iter()
                .map(|s| NextStatus {
                    value: s.as_str(),
                    label: s.label(),
                    destructive: *s == OrderStatus::Cancelled,
                })
                .collect(),
        }
    }
}

/// Row of the installment applications table.
#[derive(Clone)]
pub struct InstallmentRowView {
    pub id: String,
    pub reference: String,
    pub customer: String,
    pub created_at: String,
    pub total: String,
    pub months: u32,
    pub down_payment_percent: u32,
    pub monthly: String,
    pub finance_status: &'static str,
    pub finance_class: &'static str,
    /// Approve/reject buttons are only offered while pending.
    pub reviewable: bool,
}

impl From<&Order> for InstallmentRowView {
    fn from(order: &Order) -> Self {
        let months = order.installment_months.unwrap_or(0);
        let down = order.down_payment_percent.unwrap_or(0);
        let finance = order.finance_status.unwrap_or_default();
        let monthly = installment_plan(order.total_amount, months, down)
            .map(|plan| plan.monthly.display())
            .unwrap_or_default();

        Self {
            id: order.id.to_string(),
            reference: order.reference(),
            customer: order.customer_name(),
            created_at: format_datetime(order.created_at),
            total: order.total_amount.display(),
            months,
            down_payment_percent: down,
            monthly,
            finance_status: finance.label(),
            finance_class: finance_class(finance),
            reviewable: finance == FinanceStatus::Pending,
        }
    }
}

/// Row of the news table.
#[derive(Clone)]
pub struct NewsRowView {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub published: bool,
}

impl From<&News> for NewsRowView {
    fn from(news: &News) -> Self {
        Self {
            id: news.id.to_string(),
            title: news.title.clone(),
            created_at: format_datetime(news.created_at),
            published: news.published,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(json: serde_json::Value) -> Order {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_row_offers_allowed_transitions_only() {
        let row = OrderRowView::from(&order(serde_json::json!({
            "_id": "o1",
            "status": "confirmed",
            "items": [{ "name": "iPhone 15", "quantity": 2 }]
        })));
        let next: Vec<_> = row.next.iter().map(|n| n.value).collect();
        assert_eq!(next, vec!["shipping", "cancelled"]);
        assert!(row.next[1].destructive);
        assert_eq!(row.items, "iPhone 15 × 2");

        let done = OrderRowView::from(&order(serde_json::json!({ "_id": "o2", "status": "delivered" })));
        assert!(done.next.is_empty());
    }

    #[test]
    fn test_installment_row() {
        let row = InstallmentRowView::from(&order(serde_json::json!({
            "_id": "o3",
            "totalAmount": 12000000,
            "isInstallment": true,
            "installmentMonths": 6,
            "downPaymentPercent": 50,
            "financeStatus": "pending"
        })));
        assert!(row.reviewable);
        assert_eq!(row.monthly, "1.000.000 ₫");
        assert_eq!(row.finance_class, "badge-warning");
    }

    #[test]
    fn test_format_datetime_in_vietnam_time() {
        let at = "2026-03-01T17:30:00Z".parse().ok();
        assert_eq!(format_datetime(at), "02/03/2026 00:30");
        assert_eq!(format_datetime(None), "");
    }
}
