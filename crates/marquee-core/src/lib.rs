//! # marquee-core: Pure Business Logic for Marquee Rentals
//!
//! This crate is the **heart** of Marquee Rentals. It contains the order
//! financial and fulfillment reconciliation rules as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Marquee Rentals Architecture                     │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │              ★ marquee-core (THIS CRATE) ★                    │ │
//! │  │                                                               │ │
//! │  │  ┌───────┐ ┌───────┐ ┌────────┐ ┌─────────┐ ┌─────────────┐ │ │
//! │  │  │ money │ │ order │ │ bundle │ │ returns │ │ installment │ │ │
//! │  │  └───────┘ └───────┘ └────────┘ └─────────┘ └─────────────┘ │ │
//! │  │                                                               │ │
//! │  │  NO I/O • NO DATABASE • NO CLOCK READS • PURE FUNCTIONS      │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐ │
//! │  │                 marquee-db (Database Layer)                   │ │
//! │  │           SQLite queries, migrations, repositories            │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` type with integer-cents arithmetic (no floating point!)
//! - [`types`] - Domain types (Product, Bundle, ReturnEvent, Installment)
//! - [`order`] - Order and line items with the total/discount/due invariants
//! - [`discount`] - Discount specification and computation
//! - [`bundle`] - Proportional bundle pricing and line-item merging
//! - [`returns`] - Append-only return ledger aggregation
//! - [`installment`] - Installment scheduling and payment reconciliation
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output; "today" and "now" are
//!    always parameters, never read from a clock inside this crate
//! 2. **Integer Money**: all monetary values are cents (i64)
//! 3. **Derived Status**: installment and return statuses are computed from
//!    dates and quantities on every read, never stored
//! 4. **Explicit Errors**: all failures are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use marquee_core::money::{Money, Percent};
//! use marquee_core::discount::Discount;
//!
//! let gross = Money::from_cents(10_000);
//! let discount = Discount::Percentage(Percent::from_percentage(10.0));
//! let breakdown = discount.compute(gross);
//!
//! assert_eq!(breakdown.discount_amount.cents(), 1_000);
//! assert_eq!(breakdown.final_amount.cents(), 9_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bundle;
pub mod discount;
pub mod error;
pub mod installment;
pub mod money;
pub mod order;
pub mod returns;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discount::{Discount, DiscountBreakdown, DiscountKind};
pub use error::{CoreError, CoreResult, ValidationError};
pub use installment::{InstallmentSummary, NewInstallment, PaidRemovalPolicy};
pub use money::{Money, Percent};
pub use order::{LineItem, Order};
pub use returns::{ReturnRequest, ReturnRequestItem, ReturnSummaryLine};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line item.
///
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum line items on a single order.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum installments a generated schedule may produce.
pub const MAX_SCHEDULE_INSTALLMENTS: u32 = 12;
