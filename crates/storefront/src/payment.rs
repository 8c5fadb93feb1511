//! Bank transfer payment via VietQR.
//!
//! The QR image itself is rendered by `img.vietqr.io`; we only build its URL
//! and track how long the shopper has to complete the transfer. Nothing here
//! verifies that money arrived: staff confirm the order from the admin.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use mobistore_core::Money;

use crate::backend::Order;
use crate::config::VietQrConfig;

const VIETQR_IMAGE_BASE: &str = "https://img.vietqr.io/image";

/// Transfer memo the shop's bank statement is matched against.
#[must_use]
pub fn transfer_memo(order: &Order) -> String {
    format!("Thanh toan don hang {}", order.reference())
}

/// URL of the VietQR image for paying `amount` towards `order`.
///
/// ```text
/// https://img.vietqr.io/image/{bank}-{account}-{template}.png?amount=..&addInfo=..&accountName=..
/// ```
#[must_use]
pub fn qr_image_url(config: &VietQrConfig, amount: Money, order: &Order) -> String {
    format!(
        "{VIETQR_IMAGE_BASE}/{bank}-{account}-{template}.png?amount={amount}&addInfo={memo}&accountName={name}",
        bank = urlencoding::encode(&config.bank_id),
        account = urlencoding::encode(&config.account_no),
        template = urlencoding::encode(&config.template),
        amount = amount.dong(),
        memo = urlencoding::encode(&transfer_memo(order)),
        name = urlencoding::encode(&config.account_name),
    )
}

/// Time left to complete a bank transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentWindow {
    deadline: DateTime<Utc>,
}

impl PaymentWindow {
    /// Window opening at `start` and lasting `ttl`.
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>, ttl: Duration) -> Self {
        let ttl = TimeDelta::from_std(ttl).unwrap_or_else(|_| TimeDelta::minutes(15));
        Self {
            deadline: start + ttl,
        }
    }

    /// Window for an order, counted from its creation time (or `now` when
    /// the backend did not report one).
    #[must_use]
    pub fn for_order(order: &Order, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self::starting_at(order.created_at.unwrap_or(now), ttl)
    }

    #[must_use]
    pub const fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Whole seconds left, saturating at zero.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((self.deadline - now).num_seconds()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now) == 0
    }

    /// Remaining time as `mm:ss`.
    #[must_use]
    pub fn countdown(&self, now: DateTime<Utc>) -> String {
        let remaining = self.remaining(now);
        format!("{:02}:{:02}", remaining / 60, remaining % 60)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn vietqr() -> VietQrConfig {
        VietQrConfig {
            bank_id: "970422".to_string(),
            account_no: "0123456789".to_string(),
            account_name: "CONG TY MOBISTORE".to_string(),
            template: "compact2".to_string(),
        }
    }

    fn order(code: Option<&str>) -> Order {
        let mut json = serde_json::json!({
            "_id": "65f0c2a9b1d4e3f2a1b0c9d8",
            "totalAmount": 21990000,
            "createdAt": "2026-03-01T10:00:00Z"
        });
        if let Some(code) = code {
            json["orderCode"] = serde_json::Value::String(code.to_string());
        }
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_qr_image_url() {
        let url = qr_image_url(&vietqr(), Money::from_dong(21_990_000), &order(Some("MS1024")));
        assert_eq!(
            url,
            "https://img.vietqr.io/image/970422-0123456789-compact2.png\
             ?amount=21990000\
             &addInfo=Thanh%20toan%20don%20hang%20MS1024\
             &accountName=CONG%20TY%20MOBISTORE"
        );
    }

    #[test]
    fn test_memo_without_order_code_uses_id_tail() {
        assert_eq!(transfer_memo(&order(None)), "Thanh toan don hang A1B0C9D8");
    }

    #[test]
    fn test_window_counts_down_from_order_creation() {
        let order = order(None);
        let created = order.created_at.unwrap();
        let window = PaymentWindow::for_order(&order, Duration::from_secs(15 * 60), Utc::now());

        let now = created + TimeDelta::seconds(61);
        assert_eq!(window.remaining(now), 839);
        assert_eq!(window.countdown(now), "13:59");
        assert!(!window.is_expired(now));
    }

    #[test]
    fn test_window_saturates_after_deadline() {
        let start = Utc::now();
        let window = PaymentWindow::starting_at(start, Duration::from_secs(60));
        let later = start + TimeDelta::minutes(5);
        assert_eq!(window.remaining(later), 0);
        assert_eq!(window.countdown(later), "00:00");
        assert!(window.is_expired(later));
    }
}
