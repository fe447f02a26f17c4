//! # Discount Calculator
//!
//! Derives the discount amount and final amount from a discount
//! specification and a gross total.
//!
//! ## Rules
//! - `None` (or a zero value) means no discount.
//! - `Fixed` is an amount already in cents; it is **not** clamped here - the
//!   final amount floors at zero instead, so an oversized fixed discount
//!   yields a zero final amount, never a negative one.
//! - `Percentage` is applied with half-up rounding against the gross.
//! - The discount is always recomputed from the stored spec whenever the
//!   gross changes ([`crate::order::Order::recalculate`] is the single choke
//!   point); a previously computed amount is never carried forward.
//! - Changing the discount *kind* resets the value to zero, so a percentage
//!   can never be silently reinterpreted as fixed cents (or vice versa).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::{Money, Percent};
use crate::validation::validate_discount_bps;

// =============================================================================
// Discount Specification
// =============================================================================

/// A discount specification attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// No discount.
    None,
    /// A fixed amount in cents.
    Fixed(Money),
    /// A percentage of the gross total.
    Percentage(Percent),
}

/// Discriminant-only view of a [`Discount`], used when the operator switches
/// the kind before entering a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    None,
    Fixed,
    Percentage,
}

/// The two derived amounts a discount computation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountBreakdown {
    pub discount_amount: Money,
    pub final_amount: Money,
}

impl Default for Discount {
    fn default() -> Self {
        Discount::None
    }
}

impl Discount {
    /// Returns the kind of this spec.
    pub fn kind(&self) -> DiscountKind {
        match self {
            Discount::None => DiscountKind::None,
            Discount::Fixed(_) => DiscountKind::Fixed,
            Discount::Percentage(_) => DiscountKind::Percentage,
        }
    }

    /// A zero-valued spec of the given kind.
    ///
    /// Installed when the operator changes the discount kind: the numeric
    /// value always resets so a `10` meant as percent never survives as
    /// 10 cents.
    pub fn zeroed(kind: DiscountKind) -> Discount {
        match kind {
            DiscountKind::None => Discount::None,
            DiscountKind::Fixed => Discount::Fixed(Money::zero()),
            DiscountKind::Percentage => Discount::Percentage(Percent::zero()),
        }
    }

    /// Validates the spec's value range. Percentages above 100% are
    /// rejected; fixed amounts must not be negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Discount::None => Ok(()),
            Discount::Fixed(amount) => {
                if amount.is_negative() {
                    Err(ValidationError::MustBePositive {
                        field: "discount_value".to_string(),
                    })
                } else {
                    Ok(())
                }
            }
            Discount::Percentage(rate) => validate_discount_bps(rate.bps()),
        }
    }

    /// Computes the discount amount and final amount for a gross total.
    ///
    /// `final_amount = max(0, gross - discount_amount)`.
    ///
    /// ## Example
    /// ```rust
    /// use marquee_core::discount::Discount;
    /// use marquee_core::money::{Money, Percent};
    ///
    /// let spec = Discount::Percentage(Percent::from_percentage(10.0));
    /// let breakdown = spec.compute(Money::from_cents(10_000));
    ///
    /// assert_eq!(breakdown.discount_amount.cents(), 1_000);
    /// assert_eq!(breakdown.final_amount.cents(), 9_000);
    /// ```
    pub fn compute(&self, gross: Money) -> DiscountBreakdown {
        let discount_amount = match self {
            Discount::None => Money::zero(),
            Discount::Fixed(amount) => *amount,
            Discount::Percentage(rate) => gross.percent(*rate),
        };

        DiscountBreakdown {
            discount_amount,
            final_amount: (gross - discount_amount).floor_zero(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_discount() {
        let breakdown = Discount::None.compute(Money::from_cents(10_000));
        assert_eq!(breakdown.discount_amount, Money::zero());
        assert_eq!(breakdown.final_amount.cents(), 10_000);
    }

    #[test]
    fn test_zero_value_behaves_like_none() {
        let fixed = Discount::Fixed(Money::zero()).compute(Money::from_cents(10_000));
        assert_eq!(fixed.final_amount.cents(), 10_000);

        let pct = Discount::Percentage(Percent::zero()).compute(Money::from_cents(10_000));
        assert_eq!(pct.final_amount.cents(), 10_000);
    }

    #[test]
    fn test_fixed_discount() {
        let breakdown = Discount::Fixed(Money::from_cents(2_500)).compute(Money::from_cents(10_000));
        assert_eq!(breakdown.discount_amount.cents(), 2_500);
        assert_eq!(breakdown.final_amount.cents(), 7_500);
    }

    #[test]
    fn test_fixed_discount_larger_than_gross_floors_final_at_zero() {
        let breakdown = Discount::Fixed(Money::from_cents(12_000)).compute(Money::from_cents(10_000));
        // The discount amount itself is not clamped at this layer
        assert_eq!(breakdown.discount_amount.cents(), 12_000);
        assert_eq!(breakdown.final_amount, Money::zero());
    }

    #[test]
    fn test_percentage_discount() {
        let breakdown = Discount::Percentage(Percent::from_percentage(10.0))
            .compute(Money::from_cents(10_000));
        assert_eq!(breakdown.discount_amount.cents(), 1_000);
        assert_eq!(breakdown.final_amount.cents(), 9_000);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 15% of 333 = 49.95 -> 50
        let breakdown =
            Discount::Percentage(Percent::from_percentage(15.0)).compute(Money::from_cents(333));
        assert_eq!(breakdown.discount_amount.cents(), 50);
        assert_eq!(breakdown.final_amount.cents(), 283);
    }

    #[test]
    fn test_recompute_tracks_new_gross() {
        let spec = Discount::Percentage(Percent::from_percentage(10.0));

        let first = spec.compute(Money::from_cents(10_000));
        assert_eq!(first.discount_amount.cents(), 1_000);

        // Gross changed: recomputing from the same spec never reuses the
        // stale amount
        let second = spec.compute(Money::from_cents(20_000));
        assert_eq!(second.discount_amount.cents(), 2_000);
        assert_eq!(second.final_amount.cents(), 18_000);
    }

    #[test]
    fn test_kind_change_resets_value() {
        let spec = Discount::Percentage(Percent::from_percentage(10.0));
        let reset = Discount::zeroed(DiscountKind::Fixed);

        assert_eq!(spec.kind(), DiscountKind::Percentage);
        assert_eq!(reset, Discount::Fixed(Money::zero()));
        assert_eq!(
            reset.compute(Money::from_cents(10_000)).final_amount.cents(),
            10_000
        );
    }

    #[test]
    fn test_json_shape_keeps_kinds_apart() {
        // The (kind, value) tagging is what prevents a percentage from
        // being reread as fixed cents.
        let pct = Discount::Percentage(Percent::from_percentage(10.0));
        assert_eq!(
            serde_json::to_value(pct).unwrap(),
            serde_json::json!({"kind": "percentage", "value": 1000})
        );

        let fixed: Discount =
            serde_json::from_value(serde_json::json!({"kind": "fixed", "value": 1000})).unwrap();
        assert_eq!(fixed, Discount::Fixed(Money::from_cents(1_000)));
        // Same stored number, different meaning once the gross moves
        assert_ne!(
            fixed.compute(Money::from_cents(20_000)),
            pct.compute(Money::from_cents(20_000))
        );
    }

    #[test]
    fn test_validate_rejects_over_100_percent() {
        assert!(Discount::Percentage(Percent::from_bps(10_001)).validate().is_err());
        assert!(Discount::Percentage(Percent::from_bps(10_000)).validate().is_ok());
        assert!(Discount::Fixed(Money::from_cents(-1)).validate().is_err());
        assert!(Discount::None.validate().is_ok());
    }
}
