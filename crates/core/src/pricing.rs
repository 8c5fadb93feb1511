//! Price arithmetic shared by the cart, product detail and checkout pages.
//!
//! The backend owns the price records; these functions only derive what the
//! pages display from them. Cart lines come back from the backend with the
//! price in one of several places depending on how the line was created, so
//! [`unit_price`] walks a fixed fallback chain.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use thiserror::Error;

use crate::types::{DeviceCondition, Money};

/// Errors from pricing calculations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("installment term must be one of 3, 6, 9 or 12 months (got {0})")]
    InvalidTerm(u32),
    #[error("down payment must be between 0% and {max}% (got {got}%)")]
    InvalidDownPayment { got: u32, max: u32 },
}

/// Anything that can be priced as a cart line.
pub trait CartLinePrice {
    /// Number of units on the line.
    fn quantity(&self) -> u32;
    /// Price stored on the selected variant, if any.
    fn variant_price(&self) -> Option<Money>;
    /// Price stored on the cart line itself, if any.
    fn line_price(&self) -> Option<Money>;
    /// Price of the populated product record, if any.
    fn product_price(&self) -> Option<Money>;
}

/// Unit price of a cart line: the first present, non-zero value of
/// variant price, line price, product price; otherwise zero.
#[must_use]
pub fn unit_price<L: CartLinePrice + ?Sized>(line: &L) -> Money {
    [line.variant_price(), line.line_price(), line.product_price()]
        .into_iter()
        .flatten()
        .find(|price| !price.is_zero())
        .unwrap_or(Money::ZERO)
}

/// `quantity × unit_price`.
#[must_use]
pub fn line_total<L: CartLinePrice + ?Sized>(line: &L) -> Money {
    unit_price(line).times(line.quantity())
}

/// Sum of line totals.
#[must_use]
pub fn cart_subtotal<L: CartLinePrice>(lines: &[L]) -> Money {
    lines.iter().map(line_total).sum()
}

/// Sum of quantities.
#[must_use]
pub fn cart_item_count<L: CartLinePrice>(lines: &[L]) -> u32 {
    lines
        .iter()
        .fold(0u32, |acc, line| acc.saturating_add(line.quantity()))
}

/// Apply a percentage discount; `percent` is clamped to `0..=100`.
#[must_use]
pub fn discounted(price: Money, percent: Decimal) -> Money {
    let percent = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    price.percent(Decimal::ONE_HUNDRED - percent)
}

/// Price reduction applied to non-new devices that have no explicit price.
#[must_use]
pub fn condition_reduction(condition: DeviceCondition) -> Decimal {
    match condition {
        DeviceCondition::New => Decimal::ZERO,
        DeviceCondition::LikeNew => Decimal::TEN,
        DeviceCondition::Used => Decimal::from(20),
    }
}

/// What the shopper picked on the product page.
#[derive(Debug, Clone, Default)]
pub struct PriceSelection {
    /// Product list price.
    pub base_price: Money,
    /// Product-level discount percentage.
    pub discount_percent: Decimal,
    /// Explicit price of the selected variant, if it has one.
    pub variant_price: Option<Money>,
    /// Condition of the selected variant.
    pub condition: DeviceCondition,
    /// Additive adjustment of the selected color.
    pub color_adjustment: Option<Money>,
}

/// Price shown on the product page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayPrice {
    /// Price before the discount.
    pub original: Money,
    /// Price the shopper pays.
    pub final_price: Money,
    /// Whole-percent saving relative to `original`.
    pub saved_percent: u32,
}

impl DisplayPrice {
    /// Whether a strike-through original price should be shown.
    #[must_use]
    pub fn has_saving(&self) -> bool {
        self.final_price < self.original
    }
}

/// Compute the product page price for a selection.
///
/// Order: variant price (else base price), plus color adjustment, minus the
/// product discount, minus the condition reduction. Explicit variant prices
/// already reflect condition, so the reduction only applies without one.
#[must_use]
pub fn display_price(selection: &PriceSelection) -> DisplayPrice {
    let start = selection
        .variant_price
        .filter(|price| !price.is_zero())
        .unwrap_or(selection.base_price);
    let original = start + selection.color_adjustment.unwrap_or(Money::ZERO);

    let mut final_price = discounted(original, selection.discount_percent);
    if selection.variant_price.is_none_or(|price| price.is_zero()) {
        final_price = discounted(final_price, condition_reduction(selection.condition));
    }

    let saved_percent = if original.is_zero() || final_price >= original {
        0
    } else {
        let saved = (original.amount() - final_price.amount()) * Decimal::ONE_HUNDRED
            / original.amount();
        saved.round().to_u32().unwrap_or(0)
    };

    DisplayPrice {
        original,
        final_price,
        saved_percent,
    }
}

/// Allowed installment terms in months.
pub const INSTALLMENT_TERMS: [u32; 4] = [3, 6, 9, 12];

/// Highest down payment percentage accepted at checkout.
pub const MAX_DOWN_PAYMENT_PERCENT: u32 = 70;

/// A zero-interest installment schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstallmentPlan {
    pub total: Money,
    pub down_payment: Money,
    pub financed: Money,
    pub months: u32,
    /// Payment for months `1..months`.
    pub monthly: Money,
    /// Final month's payment (absorbs the rounding remainder).
    pub last_month: Money,
}

/// Split `total` into a down payment and `months` equal payments.
///
/// # Errors
///
/// Returns [`PricingError`] for an unsupported term or down payment.
pub fn installment_plan(
    total: Money,
    months: u32,
    down_payment_percent: u32,
) -> Result<InstallmentPlan, PricingError> {
    if !INSTALLMENT_TERMS.contains(&months) {
        return Err(PricingError::InvalidTerm(months));
    }
    if down_payment_percent > MAX_DOWN_PAYMENT_PERCENT {
        return Err(PricingError::InvalidDownPayment {
            got: down_payment_percent,
            max: MAX_DOWN_PAYMENT_PERCENT,
        });
    }

    let down_payment = total.percent(Decimal::from(down_payment_percent));
    let financed = total - down_payment;
    let financed_dong = financed.dong();
    let monthly = financed_dong / u64::from(months);
    let last_month = financed_dong - monthly * u64::from(months - 1);

    Ok(InstallmentPlan {
        total,
        down_payment,
        financed,
        months,
        monthly: Money::from_dong(monthly),
        last_month: Money::from_dong(last_month),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Line {
        quantity: u32,
        variant: Option<u64>,
        line: Option<u64>,
        product: Option<u64>,
    }

    impl CartLinePrice for Line {
        fn quantity(&self) -> u32 {
            self.quantity
        }
        fn variant_price(&self) -> Option<Money> {
            self.variant.map(Money::from_dong)
        }
        fn line_price(&self) -> Option<Money> {
            self.line.map(Money::from_dong)
        }
        fn product_price(&self) -> Option<Money> {
            self.product.map(Money::from_dong)
        }
    }

    fn line(quantity: u32, variant: Option<u64>, line: Option<u64>, product: Option<u64>) -> Line {
        Line {
            quantity,
            variant,
            line,
            product,
        }
    }

    #[test]
    fn test_unit_price_fallback_chain() {
        assert_eq!(unit_price(&line(1, Some(300), Some(200), Some(100))).dong(), 300);
        assert_eq!(unit_price(&line(1, None, Some(200), Some(100))).dong(), 200);
        assert_eq!(unit_price(&line(1, None, None, Some(100))).dong(), 100);
        assert_eq!(unit_price(&line(1, None, None, None)), Money::ZERO);
    }

    #[test]
    fn test_unit_price_skips_zero_values() {
        assert_eq!(unit_price(&line(1, Some(0), None, Some(100))).dong(), 100);
        assert_eq!(unit_price(&line(1, Some(0), Some(0), Some(0))), Money::ZERO);
    }

    #[test]
    fn test_cart_totals() {
        let lines = vec![
            line(2, Some(10_000_000), None, None),
            line(1, None, None, Some(5_490_000)),
            line(3, None, None, None),
        ];
        assert_eq!(cart_subtotal(&lines).dong(), 25_490_000);
        assert_eq!(cart_item_count(&lines), 6);
    }

    #[test]
    fn test_empty_cart() {
        let lines: Vec<Line> = Vec::new();
        assert_eq!(cart_subtotal(&lines), Money::ZERO);
        assert_eq!(cart_item_count(&lines), 0);
    }

    #[test]
    fn test_discount_clamped() {
        let price = Money::from_dong(1_000_000);
        assert_eq!(discounted(price, Decimal::from(15)).dong(), 850_000);
        assert_eq!(discounted(price, Decimal::from(150)), Money::ZERO);
        assert_eq!(discounted(price, Decimal::from(-5)), price);
    }

    #[test]
    fn test_display_price_base_with_discount() {
        let price = display_price(&PriceSelection {
            base_price: Money::from_dong(20_000_000),
            discount_percent: Decimal::from(10),
            ..PriceSelection::default()
        });
        assert_eq!(price.original.dong(), 20_000_000);
        assert_eq!(price.final_price.dong(), 18_000_000);
        assert_eq!(price.saved_percent, 10);
        assert!(price.has_saving());
    }

    #[test]
    fn test_display_price_variant_and_color() {
        let price = display_price(&PriceSelection {
            base_price: Money::from_dong(20_000_000),
            discount_percent: Decimal::ZERO,
            variant_price: Some(Money::from_dong(24_000_000)),
            condition: DeviceCondition::Used,
            color_adjustment: Some(Money::from_dong(500_000)),
        });
        // Explicit variant price: no condition reduction.
        assert_eq!(price.original.dong(), 24_500_000);
        assert_eq!(price.final_price.dong(), 24_500_000);
        assert!(!price.has_saving());
    }

    #[test]
    fn test_display_price_condition_reduction() {
        let price = display_price(&PriceSelection {
            base_price: Money::from_dong(10_000_000),
            discount_percent: Decimal::from(10),
            condition: DeviceCondition::LikeNew,
            ..PriceSelection::default()
        });
        assert_eq!(price.final_price.dong(), 8_100_000);
        assert_eq!(price.saved_percent, 19);
    }

    #[test]
    fn test_installment_plan_even_split() {
        let plan = installment_plan(Money::from_dong(12_000_000), 6, 20).unwrap();
        assert_eq!(plan.down_payment.dong(), 2_400_000);
        assert_eq!(plan.financed.dong(), 9_600_000);
        assert_eq!(plan.monthly.dong(), 1_600_000);
        assert_eq!(plan.last_month.dong(), 1_600_000);
    }

    #[test]
    fn test_installment_plan_remainder_in_last_month() {
        let plan = installment_plan(Money::from_dong(1_000_000), 3, 0).unwrap();
        assert_eq!(plan.monthly.dong(), 333_333);
        assert_eq!(plan.last_month.dong(), 333_334);
        let paid = plan.monthly.dong() * 2 + plan.last_month.dong();
        assert_eq!(paid, 1_000_000);
    }

    #[test]
    fn test_installment_plan_rejects_bad_input() {
        assert_eq!(
            installment_plan(Money::from_dong(1), 5, 0),
            Err(PricingError::InvalidTerm(5))
        );
        assert!(matches!(
            installment_plan(Money::from_dong(1), 6, 80),
            Err(PricingError::InvalidDownPayment { .. })
        ));
    }
}
