//! Transport records for the admin endpoints.
//!
//! Analytics payloads vary between backend versions, so most numeric fields
//! default to zero and accept a couple of aliases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mobistore_core::{
    FinanceStatus, Money, NewsId, OrderId, OrderStatus, PaymentMethod, UserId, UserRole,
};

// =============================================================================
// Users
// =============================================================================

/// An account as seen by the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: Option<DateTime<Utc>>,
}

/// Response of `POST /users/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

// =============================================================================
// Analytics
// =============================================================================

/// Counters from `GET /dashboard/summary`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSummary {
    #[serde(alias = "revenue")]
    pub total_revenue: Money,
    #[serde(alias = "orders")]
    pub total_orders: u64,
    #[serde(alias = "customers", alias = "totalUsers")]
    pub total_customers: u64,
    #[serde(alias = "products")]
    pub total_products: u64,
    pub pending_orders: u64,
}

/// One month of `GET /analytics/revenue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    #[serde(alias = "month")]
    pub label: String,
    #[serde(default)]
    pub revenue: Money,
    #[serde(default)]
    pub orders: u64,
}

/// One row of `GET /analytics/order-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    #[serde(alias = "_id")]
    pub status: String,
    #[serde(default)]
    pub count: u64,
}

/// One row of `GET /analytics/top-products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "totalSold", alias = "quantity")]
    pub sold: u64,
    #[serde(default)]
    pub revenue: Money,
}

/// One month of `GET /analytics/customer-growth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerGrowthPoint {
    #[serde(alias = "month")]
    pub label: String,
    #[serde(default, alias = "count", alias = "newCustomers")]
    pub customers: u64,
}

/// Month-over-month growth in percent; `None` where it is undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Growth {
    #[serde(alias = "revenueGrowth")]
    pub revenue: Option<f64>,
    #[serde(alias = "ordersGrowth")]
    pub orders: Option<f64>,
    #[serde(alias = "customersGrowth")]
    pub customers: Option<f64>,
}

// =============================================================================
// Orders
// =============================================================================

/// Buyer as populated on admin order listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Buyer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Recipient snapshot on an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
}

/// A line on an order; admin screens only show names and quantities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(default)]
    pub name: String,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// An order as returned by the admin endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub order_code: Option<String>,
    #[serde(default, rename = "user")]
    pub buyer: Option<Buyer>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub total_amount: Money,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub is_installment: bool,
    pub finance_status: Option<FinanceStatus>,
    pub installment_months: Option<u32>,
    pub down_payment_percent: Option<u32>,
    pub shipping_address: Option<ShippingAddress>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Order code, else the id's tail.
    #[must_use]
    pub fn reference(&self) -> String {
        self.order_code
            .clone()
            .filter(|code| !code.trim().is_empty())
            .unwrap_or_else(|| self.id.short().to_uppercase())
    }

    /// Buyer's name, else the recipient's.
    #[must_use]
    pub fn customer_name(&self) -> String {
        self.buyer
            .as_ref()
            .map(|b| b.name.trim())
            .filter(|n| !n.is_empty())
            .or_else(|| {
                self.shipping_address
                    .as_ref()
                    .map(|a| a.full_name.trim())
                    .filter(|n| !n.is_empty())
            })
            .unwrap_or("Khách lẻ")
            .to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceUpdate {
    pub finance_status: FinanceStatus,
}

// =============================================================================
// News
// =============================================================================

/// A news article, drafts included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct News {
    #[serde(rename = "_id")]
    pub id: NewsId,
    #[serde(default)]
    pub title: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub content: String,
    pub image: Option<String>,
    #[serde(default = "published_default")]
    pub published: bool,
    pub created_at: Option<DateTime<Utc>>,
}

const fn published_default() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_aliases_and_defaults() {
        let summary: DashboardSummary =
            serde_json::from_str(r#"{"revenue":125000000,"orders":42,"totalUsers":17}"#).unwrap();
        assert_eq!(summary.total_revenue.dong(), 125_000_000);
        assert_eq!(summary.total_orders, 42);
        assert_eq!(summary.total_customers, 17);
        assert_eq!(summary.total_products, 0);
    }

    #[test]
    fn test_status_count_from_aggregation() {
        let rows: Vec<StatusCount> =
            serde_json::from_str(r#"[{"_id":"pending","count":3},{"status":"delivered","count":9}]"#)
                .unwrap();
        assert_eq!(rows[0].status, "pending");
        assert_eq!(rows[1].count, 9);
    }

    #[test]
    fn test_order_customer_name_fallbacks() {
        let order: Order = serde_json::from_str(
            r#"{"_id":"665f1c2e9b1d4a0012ab34cd","user":{"name":" "},"shippingAddress":{"fullName":"Ngô Lan","phone":"0901234567"}}"#,
        )
        .unwrap();
        assert_eq!(order.customer_name(), "Ngô Lan");
        assert_eq!(order.reference(), "12AB34CD");

        let bare: Order = serde_json::from_str(r#"{"_id":"o1"}"#).unwrap();
        assert_eq!(bare.customer_name(), "Khách lẻ");
    }
}
