//! Tolerance bands for monetary comparisons.
//!
//! All arithmetic is on integer minor units; floating point never enters a
//! comparison, so equal inputs can never drift into spurious mismatches.

use apflow_core::Money;

/// Tolerance policy for rate and total comparisons.
///
/// A comparison passes when the absolute difference is within the absolute
/// band, or within the relative band measured against the reference
/// (PO-side) value. Quantities are compared exactly and do not use this
/// policy.
///
/// Defaults: 100 minor units absolute, 50 basis points (0.5%) relative.
/// These mirror the slack finance already grants for rounding between
/// vendor billing systems and PO entry; anything wider needs an explicit
/// policy override at construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TolerancePolicy {
    /// Absolute band in minor units.
    pub amount_tolerance_minor: i64,
    /// Relative band in basis points of the reference value.
    pub rate_tolerance_bps: u32,
}

impl Default for TolerancePolicy {
    fn default() -> Self {
        Self {
            amount_tolerance_minor: 100,
            rate_tolerance_bps: 50,
        }
    }
}

impl TolerancePolicy {
    pub const fn exact() -> Self {
        Self {
            amount_tolerance_minor: 0,
            rate_tolerance_bps: 0,
        }
    }

    /// Is `actual` within tolerance of `reference`?
    pub fn within(&self, actual: Money, reference: Money) -> bool {
        let diff = actual.abs_diff(reference);
        if diff <= self.amount_tolerance_minor {
            return true;
        }
        // Relative band, computed in i128 so large references cannot overflow.
        let allowed =
            (i128::from(reference.minor()).abs() * i128::from(self.rate_tolerance_bps)) / 10_000;
        i128::from(diff) <= allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_policy_accepts_only_equality() {
        let policy = TolerancePolicy::exact();
        assert!(policy.within(Money::from_minor(500), Money::from_minor(500)));
        assert!(!policy.within(Money::from_minor(501), Money::from_minor(500)));
    }

    #[test]
    fn absolute_band_applies_to_small_amounts() {
        let policy = TolerancePolicy::default();
        // 100 minor units of slack either way.
        assert!(policy.within(Money::from_minor(1_060), Money::from_minor(1_000)));
        assert!(!policy.within(Money::from_minor(1_101), Money::from_minor(1_000)));
    }

    #[test]
    fn relative_band_applies_to_large_amounts() {
        let policy = TolerancePolicy::default();
        // 50 bps of 10_000_00 minor units = 5_000.
        assert!(policy.within(
            Money::from_minor(1_000_000 + 5_000),
            Money::from_minor(1_000_000)
        ));
        assert!(!policy.within(
            Money::from_minor(1_000_000 + 5_001),
            Money::from_minor(1_000_000)
        ));
    }

    #[test]
    fn within_handles_negative_references() {
        let policy = TolerancePolicy::default();
        // Credit notes: reference may be negative; the band is symmetric.
        assert!(policy.within(Money::from_minor(-1_050), Money::from_minor(-1_000)));
    }
}
