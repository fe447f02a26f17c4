//! # Domain Types
//!
//! Core domain types for Marquee Rentals.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                               │
//! │                                                                     │
//! │  ┌───────────────┐  ┌───────────────┐  ┌────────────────┐          │
//! │  │   Product     │  │    Bundle     │  │  Installment   │          │
//! │  │  ───────────  │  │  ───────────  │  │  ────────────  │          │
//! │  │  id (UUID)    │  │  id (UUID)    │  │  id (UUID)     │          │
//! │  │  name (biz)   │  │  name (biz)   │  │  order_id (FK) │          │
//! │  │  price_cents  │  │  price_cents  │  │  sequence      │          │
//! │  │  stock        │  │  items[]      │  │  amount_cents  │          │
//! │  └───────────────┘  └───────────────┘  └────────────────┘          │
//! │                                                                     │
//! │  ┌───────────────┐     statuses are DERIVED from dates/quantities, │
//! │  │  ReturnEvent  │     never stored (see InstallmentStatus,        │
//! │  │  (append-only)│     ReturnStatus)                               │
//! │  └───────────────┘                                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Entities have an immutable `id` (UUID v4) for database relations and a
//! human-facing business key (product `name`, order `order_number`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product (catalog)
// =============================================================================

/// A catalog item available for rental.
///
/// `name` is the business key: line items, bundle members and return events
/// all reference products by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name and business key (unique).
    pub name: String,

    /// Optional description for catalog details.
    pub description: Option<String>,

    /// Current rental price in cents.
    pub price_cents: i64,

    /// Units owned and available for rental.
    pub stock_quantity: i64,

    /// Whether the product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the current price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// A named promotional set of catalog items sold together at a single
/// promotional price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub id: String,
    /// Display name and business key (unique). Line items sourced from this
    /// bundle are tagged with it.
    pub name: String,
    pub description: Option<String>,
    /// Promotional price for the whole set, in cents.
    pub price_cents: i64,
    pub items: Vec<BundleItem>,
    /// Deactivated bundles remain visible in history but cannot be added to
    /// new orders.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One member of a bundle: a product and how many units of it the set
/// contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BundleItem {
    pub product_name: String,
    pub quantity: i64,
}

impl Bundle {
    /// Returns the promotional price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Total units across all member items. The proportional per-unit price
    /// divides the promotional price by this.
    pub fn total_units(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of current catalog prices across members, weighted by quantity.
    ///
    /// Computed on read against live prices, never stored. Products missing
    /// from the price map contribute zero.
    pub fn individual_total(&self, prices: &std::collections::HashMap<String, Money>) -> Money {
        self.items
            .iter()
            .map(|item| {
                prices
                    .get(&item.product_name)
                    .copied()
                    .unwrap_or(Money::zero())
                    .multiply_quantity(item.quantity)
            })
            .sum()
    }

    /// What the customer saves versus renting the members individually,
    /// floored at zero.
    pub fn savings(&self, prices: &std::collections::HashMap<String, Money>) -> Money {
        (self.individual_total(prices) - self.price()).floor_zero()
    }
}

// =============================================================================
// Return Events
// =============================================================================

/// An immutable fact: some quantity of a fulfilled line item came back.
///
/// The ledger is append-only. Corrections are made by recording further
/// events, never by editing or deleting past ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReturnEvent {
    pub id: String,
    /// Business number of the order the items came back from.
    pub order_number: i64,
    pub product_name: String,
    /// Quantity returned in this event (positive).
    pub quantity: i64,
    /// Person who handled the return.
    pub responsible: String,
    pub notes: Option<String>,
    pub returned_at: DateTime<Utc>,
}

/// Per-line-item return state, derived from ordered vs. returned quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    /// No units have come back yet.
    NotReturned,
    /// Some but not all units have come back.
    PartiallyReturned,
    /// Nothing is pending return.
    FullyReturned,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How an installment was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

// =============================================================================
// Installment
// =============================================================================

/// One scheduled partial payment against an order's final amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Installment {
    pub id: String,
    /// UUID of the owning order.
    pub order_id: String,
    /// Unique within the order, ascending.
    pub sequence: i64,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    /// Set when paid; clearing it reverses the payment. The sole source of
    /// the paid/pending distinction - status is never stored.
    pub paid_at: Option<NaiveDate>,
    pub method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Installment {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Whether a payment date is present.
    #[inline]
    pub fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }

    /// Derives the status from the record and the given day.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use marquee_core::types::{Installment, InstallmentStatus};
    /// # use chrono::Utc;
    /// # let installment = Installment {
    /// #     id: "i1".into(), order_id: "o1".into(), sequence: 1,
    /// #     amount_cents: 3_000,
    /// #     due_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
    /// #     paid_at: None, method: None, notes: None,
    /// #     created_at: Utc::now(), updated_at: Utc::now(),
    /// # };
    /// let before = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    /// let after = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
    ///
    /// assert_eq!(installment.status(before), InstallmentStatus::Pending);
    /// assert_eq!(installment.status(after), InstallmentStatus::Overdue);
    /// ```
    pub fn status(&self, today: NaiveDate) -> InstallmentStatus {
        if self.is_paid() {
            InstallmentStatus::Paid
        } else if self.due_date < today {
            InstallmentStatus::Overdue
        } else {
            InstallmentStatus::Pending
        }
    }
}

/// Derived installment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    /// Payment date is set.
    Paid,
    /// Unpaid and the due date has passed.
    Overdue,
    /// Unpaid and not yet due.
    Pending,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn bundle_with_items(price_cents: i64, items: Vec<BundleItem>) -> Bundle {
        Bundle {
            id: "b1".to_string(),
            name: "Kit A".to_string(),
            description: None,
            price_cents,
            items,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_bundle_total_units() {
        let bundle = bundle_with_items(
            3_000,
            vec![
                BundleItem {
                    product_name: "X".to_string(),
                    quantity: 2,
                },
                BundleItem {
                    product_name: "Y".to_string(),
                    quantity: 1,
                },
            ],
        );
        assert_eq!(bundle.total_units(), 3);
    }

    #[test]
    fn test_bundle_savings_floor_zero() {
        let bundle = bundle_with_items(
            5_000,
            vec![BundleItem {
                product_name: "X".to_string(),
                quantity: 2,
            }],
        );
        let mut prices = HashMap::new();
        prices.insert("X".to_string(), Money::from_cents(1_000));

        // Individual total 2000 < promotional 5000 -> savings floored at 0
        assert_eq!(bundle.individual_total(&prices).cents(), 2_000);
        assert_eq!(bundle.savings(&prices), Money::zero());
    }

    #[test]
    fn test_bundle_savings() {
        let bundle = bundle_with_items(
            3_000,
            vec![
                BundleItem {
                    product_name: "X".to_string(),
                    quantity: 2,
                },
                BundleItem {
                    product_name: "Y".to_string(),
                    quantity: 1,
                },
            ],
        );
        let mut prices = HashMap::new();
        prices.insert("X".to_string(), Money::from_cents(1_500));
        prices.insert("Y".to_string(), Money::from_cents(2_000));

        assert_eq!(bundle.individual_total(&prices).cents(), 5_000);
        assert_eq!(bundle.savings(&prices).cents(), 2_000);
    }

    #[test]
    fn test_installment_status_derivation() {
        let mut installment = Installment {
            id: "i1".to_string(),
            order_id: "o1".to_string(),
            sequence: 1,
            amount_cents: 3_000,
            due_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            paid_at: None,
            method: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let before_due = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
        let on_due = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let after_due = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        assert_eq!(installment.status(before_due), InstallmentStatus::Pending);
        // Due today is still pending, not overdue
        assert_eq!(installment.status(on_due), InstallmentStatus::Pending);
        assert_eq!(installment.status(after_due), InstallmentStatus::Overdue);

        installment.paid_at = Some(after_due);
        assert_eq!(installment.status(after_due), InstallmentStatus::Paid);
    }
}
