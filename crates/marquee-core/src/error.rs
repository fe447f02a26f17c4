//! # Error Types
//!
//! Domain-specific error types for marquee-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  marquee-core errors (this file)                                    │
//! │  ├── CoreError        - Reconciliation rule violations              │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  marquee-db errors (separate crate)                                 │
//! │  └── DbError          - Persistence failures (wraps CoreError for   │
//! │                         orchestrated operations)                    │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → DbError → caller               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The conflict-class variants carry the live ceiling alongside the
//! offending value so callers can render an actionable message without
//! re-deriving state.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Reconciliation rule violations.
///
/// Every failure leaves in-memory state unchanged: rules validate before any
/// mutation is applied.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced order does not exist (or an entity belongs to a
    /// different order than the one being reconciled).
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Referenced installment does not exist on this order.
    #[error("Installment not found: {0}")]
    InstallmentNotFound(String),

    /// Referenced bundle does not exist.
    #[error("Bundle not found: {0}")]
    BundleNotFound(String),

    /// Referenced line item does not exist on this order.
    #[error("Line item not found: {0}")]
    ItemNotFound(String),

    /// Bundle has been deactivated and cannot be added to new orders.
    #[error("Bundle '{name}' is inactive and cannot be added to an order")]
    BundleInactive { name: String },

    /// Bundle has zero total member units; the proportional per-unit price
    /// is undefined.
    #[error("Bundle '{name}' has no member units")]
    BundleHasNoUnits { name: String },

    /// Bundle-sourced line items accept quantity changes only; name and
    /// price are frozen at insertion.
    #[error("Line item '{name}' is bundle-sourced; only its quantity can change")]
    BundleItemLocked { name: String },

    /// A requested return quantity exceeds the product's current pending
    /// quantity.
    #[error(
        "Cannot return {requested} of '{product}': only {pending} pending return"
    )]
    ReturnExceedsPending {
        product: String,
        pending: i64,
        requested: i64,
    },

    /// An installment amount exceeds the order's remaining schedulable
    /// balance.
    #[error(
        "Installment amount {requested_cents} exceeds schedulable balance {available_cents}"
    )]
    InstallmentExceedsBalance {
        available_cents: i64,
        requested_cents: i64,
    },

    /// A direct payment edit exceeds the order's final amount.
    #[error("Amount paid {requested_cents} exceeds order final amount {final_amount_cents}")]
    PaymentExceedsBalance {
        final_amount_cents: i64,
        requested_cents: i64,
    },

    /// Schedule generation was requested but nothing is left to schedule.
    #[error("Nothing left to schedule: available balance is {available_cents}")]
    NothingToSchedule { available_cents: i64 },

    /// Paid installments cannot be edited; clear the payment first.
    #[error("Installment #{sequence} is paid and cannot be edited")]
    InstallmentPaid { sequence: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements, before any
/// business rule runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_messages_carry_ceiling() {
        let err = CoreError::ReturnExceedsPending {
            product: "Toalha".to_string(),
            pending: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Cannot return 3 of 'Toalha': only 2 pending return"
        );

        let err = CoreError::InstallmentExceedsBalance {
            available_cents: 9_000,
            requested_cents: 10_000,
        };
        assert!(err.to_string().contains("9000"));
        assert!(err.to_string().contains("10000"));
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "responsible".to_string(),
        };
        assert_eq!(err.to_string(), "responsible is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
