//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In floating point:  0.1 + 0.2 = 0.30000000000000004                │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Cents                                        │
//! │    9000 cents / 3 = 3000 cents exactly                              │
//! │    10000 cents / 3 = 3333 + 3333 + 3334 (remainder handled          │
//! │    explicitly by split_even, never silently lost)                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use marquee_core::money::Money;
//!
//! // Create from cents (there is no from_float - on purpose)
//! let price = Money::from_cents(1099);
//!
//! let doubled = price * 2;
//! assert_eq!(doubled.cents(), 2198);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate arithmetic may dip below zero; callers
///   clamp with [`Money::floor_zero`] where the domain forbids negatives
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Full serde support**: serialized as a bare integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use marquee_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps a negative value to zero.
    ///
    /// The reconciliation rules never let a derived amount (final amount,
    /// amount due, available-to-schedule) go below zero; this is that floor.
    ///
    /// ## Example
    /// ```rust
    /// use marquee_core::money::Money;
    ///
    /// let due = (Money::from_cents(9_000) - Money::from_cents(12_000)).floor_zero();
    /// assert_eq!(due, Money::zero());
    /// ```
    #[inline]
    pub fn floor_zero(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Applies a percentage with half-up rounding.
    ///
    /// ## Implementation
    /// Integer math throughout: `(cents × bps + 5000) / 10000`, computed in
    /// i128 so large amounts cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use marquee_core::money::{Money, Percent};
    ///
    /// let gross = Money::from_cents(10_000);
    /// let discount = gross.percent(Percent::from_percentage(10.0));
    /// assert_eq!(discount.cents(), 1_000);
    /// ```
    pub fn percent(&self, rate: Percent) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5_000) / 10_000;
        Money(cents as i64)
    }

    /// Divides by a unit count with half-up rounding.
    ///
    /// Used by bundle pricing: one shared per-unit rate for the whole set.
    /// `units` must be positive; the bundle resolver rejects empty bundles
    /// before calling this.
    ///
    /// ## Example
    /// ```rust
    /// use marquee_core::money::Money;
    ///
    /// // 3000 cents across 3 units -> 1000 cents each
    /// assert_eq!(Money::from_cents(3_000).per_unit(3).cents(), 1_000);
    /// // 1001 cents across 2 units -> 501 (round half up)
    /// assert_eq!(Money::from_cents(1_001).per_unit(2).cents(), 501);
    /// ```
    pub fn per_unit(&self, units: i64) -> Money {
        debug_assert!(units > 0, "per_unit requires a positive unit count");
        Money((self.0 + units / 2) / units)
    }

    /// Splits into `parts` amounts of `floor(total / parts)` each, with the
    /// remainder added to the **last** part so the parts sum exactly.
    ///
    /// ## Example
    /// ```rust
    /// use marquee_core::money::Money;
    ///
    /// let parts = Money::from_cents(10_000).split_even(3);
    /// assert_eq!(
    ///     parts.iter().map(Money::cents).collect::<Vec<_>>(),
    ///     vec![3_333, 3_333, 3_334],
    /// );
    /// ```
    pub fn split_even(&self, parts: u32) -> Vec<Money> {
        debug_assert!(parts > 0, "split_even requires at least one part");
        let n = parts as i64;
        let base = self.0 / n;
        let remainder = self.0 - base * n;

        let mut out = vec![Money(base); parts as usize];
        if let Some(last) = out.last_mut() {
            last.0 += remainder;
        }
        out
    }

    /// Multiplies by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use marquee_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display for debugging and console output. UI formatting/localization is
/// the frontend's job.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Percent
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10%. Keeping percentages in integer
/// basis points keeps discount math float-free end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Percent(u32);

impl Percent {
    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Creates a percentage from a decimal percentage (10.0 = 10%).
    pub fn from_percentage(pct: f64) -> Self {
        Percent((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a decimal percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
