//! Currency-agnostic monetary amounts.
//!
//! Amounts are stored in the smallest currency unit (cents, paise, ...)
//! as signed integers. All matching/tolerance arithmetic happens on these
//! integers; floating point never enters a comparison.

use serde::{Deserialize, Serialize};

/// A monetary amount in minor units.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub fn minor(self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_mul_qty(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// Absolute difference between two amounts, saturating on overflow.
    pub fn abs_diff(self, other: Money) -> i64 {
        self.0.abs_diff(other.0).min(i64::MAX as u64) as i64
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // The sign is written explicitly: `whole` truncates to 0 for
        // amounts inside one major unit, which would swallow it.
        let sign = if self.0 < 0 { "-" } else { "" };
        let whole = (self.0 / 100).abs();
        let frac = (self.0 % 100).abs();
        write!(f, "{sign}{whole}.{frac:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_diff_is_symmetric() {
        let a = Money::from_minor(1_000);
        let b = Money::from_minor(925);
        assert_eq!(a.abs_diff(b), 75);
        assert_eq!(b.abs_diff(a), 75);
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Money::from_minor(123_456).to_string(), "1234.56");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
    }

    #[test]
    fn display_keeps_the_sign_on_small_negative_amounts() {
        assert_eq!(Money::from_minor(-5).to_string(), "-0.05");
        assert_eq!(Money::from_minor(-123_456).to_string(), "-1234.56");
        assert_eq!(Money::from_minor(0).to_string(), "0.00");
    }

    #[test]
    fn mul_qty_checks_overflow() {
        assert_eq!(
            Money::from_minor(100).checked_mul_qty(8),
            Some(Money::from_minor(800))
        );
        assert!(Money::from_minor(i64::MAX).checked_mul_qty(2).is_none());
    }
}
