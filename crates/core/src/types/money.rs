//! Vietnamese đồng amounts using decimal arithmetic.
//!
//! The backend sends prices as plain JSON numbers (sometimes as numeric
//! strings). VND has no minor unit, so every amount is rounded to whole đồng
//! on construction and formatted with a dot as thousands separator.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A non-negative amount of Vietnamese đồng.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Zero đồng.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount, rounding half away from zero to whole đồng.
    /// Negative inputs clamp to zero.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Self(rounded.max(Decimal::ZERO))
    }

    /// Create an amount from whole đồng.
    #[must_use]
    pub fn from_dong(dong: u64) -> Self {
        Self(Decimal::from(dong))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whole đồng as an integer (saturating).
    #[must_use]
    pub fn dong(&self) -> u64 {
        self.0.to_u64().unwrap_or(u64::MAX)
    }

    /// Returns true for a zero amount.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Multiply by a percentage (e.g. `90` for 90 %), saturating.
    #[must_use]
    pub fn percent(self, percent: Decimal) -> Self {
        Self::new(self.0.saturating_mul(percent) / Decimal::ONE_HUNDRED)
    }

    /// Subtract, saturating at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self::new(self.0 - other.0)
    }

    /// Format for display, e.g. `29.990.000 ₫`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} ₫", group_thousands(self.dong()))
    }

    /// Compact form for chart axes and cards, e.g. `1,2 tỷ`, `850 tr`.
    #[must_use]
    pub fn compact(&self) -> String {
        let dong = self.dong();
        if dong >= 1_000_000_000 {
            format!("{} tỷ", one_decimal(self.0 / Decimal::from(1_000_000_000u64)))
        } else if dong >= 1_000_000 {
            format!("{} tr", one_decimal(self.0 / Decimal::from(1_000_000u64)))
        } else {
            self.display()
        }
    }
}

fn one_decimal(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    rounded.to_string().replace('.', ",")
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl From<u64> for Money {
    fn from(dong: u64) -> Self {
        Self::from_dong(dong)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.dong())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Text(String),
        }

        let amount = match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Decimal::from(n),
            Raw::Float(f) => Decimal::try_from(f).map_err(serde::de::Error::custom)?,
            Raw::Text(s) => s
                .trim()
                .parse::<Decimal>()
                .map_err(serde::de::Error::custom)?,
        };
        Ok(Self::new(amount))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_dong(0).display(), "0 ₫");
        assert_eq!(Money::from_dong(999).display(), "999 ₫");
        assert_eq!(Money::from_dong(1_000).display(), "1.000 ₫");
        assert_eq!(Money::from_dong(29_990_000).display(), "29.990.000 ₫");
        assert_eq!(Money::from_dong(1_234_567_890).display(), "1.234.567.890 ₫");
    }

    #[test]
    fn test_new_rounds_and_clamps() {
        assert_eq!(Money::new(Decimal::new(15, 1)).dong(), 2);
        assert_eq!(Money::new(Decimal::new(14, 1)).dong(), 1);
        assert_eq!(Money::new(Decimal::from(-5)), Money::ZERO);
    }

    #[test]
    fn test_percent() {
        let price = Money::from_dong(10_000_000);
        assert_eq!(price.percent(Decimal::from(90)).dong(), 9_000_000);
    }

    #[test]
    fn test_percent_of_huge_amount_saturates() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(
            huge.percent(Decimal::from(90)),
            Money::new(Decimal::MAX / Decimal::ONE_HUNDRED)
        );
        assert_eq!(huge.percent(Decimal::from(-10)), Money::ZERO);
    }

    #[test]
    fn test_times_and_sum() {
        let total: Money = [Money::from_dong(100), Money::from_dong(250)]
            .iter()
            .sum();
        assert_eq!(total.dong(), 350);
        assert_eq!(Money::from_dong(1_500).times(3).dong(), 4_500);
    }

    #[test]
    fn test_saturating_sub() {
        assert_eq!(Money::from_dong(5) - Money::from_dong(10), Money::ZERO);
    }

    #[test]
    fn test_compact() {
        assert_eq!(Money::from_dong(1_250_000_000).compact(), "1,3 tỷ");
        assert_eq!(Money::from_dong(850_000_000).compact(), "850 tr");
        assert_eq!(Money::from_dong(12_500_000).compact(), "12,5 tr");
        assert_eq!(Money::from_dong(500_000).compact(), "500.000 ₫");
    }

    #[test]
    fn test_deserialize_number_float_and_string() {
        let a: Money = serde_json::from_str("29990000").unwrap();
        let b: Money = serde_json::from_str("29990000.4").unwrap();
        let c: Money = serde_json::from_str("\"29990000\"").unwrap();
        assert_eq!(a.dong(), 29_990_000);
        assert_eq!(b.dong(), 29_990_000);
        assert_eq!(c.dong(), 29_990_000);
    }

    #[test]
    fn test_serialize_as_integer() {
        let json = serde_json::to_string(&Money::from_dong(1_000)).unwrap();
        assert_eq!(json, "1000");
    }
}
