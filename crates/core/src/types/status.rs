//! Status enums for various entities.
//!
//! Wire names match what the backend API sends and accepts.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// The backend is the authority on transitions; [`OrderStatus::can_transition_to`]
/// only decides which buttons the admin UI offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Shipping,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipping => "shipping",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Customer-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Chờ xác nhận",
            Self::Confirmed => "Đã xác nhận",
            Self::Shipping => "Đang giao",
            Self::Delivered => "Đã giao",
            Self::Cancelled => "Đã hủy",
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the customer may still cancel the order.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Statuses reachable from this one.
    #[must_use]
    pub const fn next_statuses(&self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Shipping, Self::Cancelled],
            Self::Shipping => &[Self::Delivered],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    /// Whether moving to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        self.next_statuses().contains(&next)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Review state of an installment (financed) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FinanceStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl FinanceStatus {
    /// Wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Customer-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Đang xét duyệt",
            Self::Approved => "Đã duyệt",
            Self::Rejected => "Bị từ chối",
        }
    }
}

impl std::fmt::Display for FinanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FinanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid finance status: {s}")),
        }
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cod,
    /// Bank transfer via VietQR.
    BankTransfer,
    /// Financed purchase, reviewed by staff.
    Installment,
}

impl PaymentMethod {
    /// All methods in checkout order.
    pub const ALL: [Self; 3] = [Self::Cod, Self::BankTransfer, Self::Installment];

    /// Wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::BankTransfer => "bank_transfer",
            Self::Installment => "installment",
        }
    }

    /// Customer-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cod => "Thanh toán khi nhận hàng",
            Self::BankTransfer => "Chuyển khoản (QR)",
            Self::Installment => "Trả góp",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| format!("invalid payment method: {s}"))
    }
}

/// Physical condition of a phone variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCondition {
    #[default]
    New,
    #[serde(alias = "like-new", alias = "likenew")]
    LikeNew,
    Used,
}

impl DeviceCondition {
    /// Customer-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::New => "Mới 100%",
            Self::LikeNew => "Like new 99%",
            Self::Used => "Đã qua sử dụng",
        }
    }
}

impl std::fmt::Display for DeviceCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::New => "new",
            Self::LikeNew => "like_new",
            Self::Used => "used",
        })
    }
}

/// Account role as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Shipping));
        assert!(OrderStatus::Shipping.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipping.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(OrderStatus::Cancelled.next_statuses().is_empty());
    }

    #[test]
    fn test_order_status_parse_roundtrip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_wire_names() {
        let json = serde_json::to_string(&PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, "\"bank_transfer\"");
        assert_eq!(
            "installment".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Installment
        );
    }

    #[test]
    fn test_condition_aliases() {
        let c: DeviceCondition = serde_json::from_str("\"like-new\"").unwrap();
        assert_eq!(c, DeviceCondition::LikeNew);
    }

    #[test]
    fn test_finance_status_serde() {
        let s: FinanceStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(s, FinanceStatus::Approved);
        assert_eq!("rejected".parse::<FinanceStatus>().unwrap(), FinanceStatus::Rejected);
    }
}
