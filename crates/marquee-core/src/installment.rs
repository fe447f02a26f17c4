//! # Installment Scheduler & Reconciler
//!
//! Manages an order's payment installments and keeps the order's aggregate
//! paid/due amounts synchronized with installment-level payments.
//!
//! ## The Scheduling Ceiling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  available_to_schedule =                                            │
//! │      max(0, final_amount - amount_paid - Σ installment amounts)     │
//! │                                                                     │
//! │  Creating an installment may not exceed it.                         │
//! │  Editing one may reuse the capacity it already occupies.            │
//! │  Generating a schedule consumes all of it, split evenly with the    │
//! │  rounding remainder folded into the last installment.               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The One Synchronization Path
//! [`toggle_payment`] is the *only* code that moves `Order::amount_paid`
//! together with an installment's paid state. Direct edits to the aggregate
//! (`Order::set_amount_paid`) and installment toggles must never both apply
//! the same money, or the aggregate double-counts.

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::order::Order;
use crate::types::{Installment, InstallmentStatus, PaymentMethod};
use crate::validation::{validate_amount_cents, validate_installment_count};

// =============================================================================
// Inputs
// =============================================================================

/// Operator input for creating or editing an installment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInstallment {
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

/// What removing a *paid* installment does to the order's paid aggregate.
///
/// The observed system never reversed the money (deleting a paid
/// installment left `amount_paid` untouched). That stays the default;
/// `ReversePayment` is the explicit companion-reversal step for callers
/// that want the money un-received on deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaidRemovalPolicy {
    /// Keep `amount_paid` as is (paid history survives deletion).
    PreservePaidAmount,
    /// Subtract the installment's amount from `amount_paid`.
    ReversePayment,
}

// =============================================================================
// Ceilings and sequences
// =============================================================================

/// The remaining amount that can still be placed on installments:
/// `max(0, final_amount - amount_paid - Σ installment amounts)`.
pub fn available_to_schedule(order: &Order, installments: &[Installment]) -> Money {
    let scheduled: Money = installments.iter().map(Installment::amount).sum();
    (order.final_amount() - order.amount_paid() - scheduled).floor_zero()
}

/// Next sequence number: `max(existing) + 1`, starting at 1.
pub fn next_sequence(installments: &[Installment]) -> i64 {
    installments
        .iter()
        .map(|installment| installment.sequence)
        .max()
        .unwrap_or(0)
        + 1
}

// =============================================================================
// Create / Edit
// =============================================================================

/// Validates and builds a single new installment for the order.
///
/// ## Errors
/// - `ValidationError::MustBePositive` for a non-positive amount
/// - [`CoreError::InstallmentExceedsBalance`] when the amount exceeds
///   [`available_to_schedule`] (the ceiling is recomputed live)
pub fn create(
    order: &Order,
    installments: &[Installment],
    input: &NewInstallment,
    now: DateTime<Utc>,
) -> CoreResult<Installment> {
    validate_amount_cents(input.amount_cents)?;

    let available = available_to_schedule(order, installments);
    if input.amount_cents > available.cents() {
        return Err(CoreError::InstallmentExceedsBalance {
            available_cents: available.cents(),
            requested_cents: input.amount_cents,
        });
    }

    Ok(Installment {
        id: Uuid::new_v4().to_string(),
        order_id: order.id.clone(),
        sequence: next_sequence(installments),
        amount_cents: input.amount_cents,
        due_date: input.due_date,
        paid_at: None,
        method: input.method,
        notes: input.notes.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Validates an edit and returns the updated installment.
///
/// The ceiling for an edit is `available_to_schedule + this installment's
/// current amount` - the edit may reuse the capacity it already occupies.
/// Paid installments are frozen.
pub fn edit(
    order: &Order,
    installments: &[Installment],
    installment_id: &str,
    input: &NewInstallment,
    now: DateTime<Utc>,
) -> CoreResult<Installment> {
    let current = installments
        .iter()
        .find(|installment| installment.id == installment_id)
        .ok_or_else(|| CoreError::InstallmentNotFound(installment_id.to_string()))?;

    if current.is_paid() {
        return Err(CoreError::InstallmentPaid {
            sequence: current.sequence,
        });
    }

    validate_amount_cents(input.amount_cents)?;

    let ceiling = available_to_schedule(order, installments) + current.amount();
    if input.amount_cents > ceiling.cents() {
        return Err(CoreError::InstallmentExceedsBalance {
            available_cents: ceiling.cents(),
            requested_cents: input.amount_cents,
        });
    }

    let mut updated = current.clone();
    updated.amount_cents = input.amount_cents;
    updated.due_date = input.due_date;
    updated.method = input.method;
    updated.notes = input.notes.clone();
    updated.updated_at = now;
    Ok(updated)
}

// =============================================================================
// Schedule generation
// =============================================================================

/// Splits the remaining schedulable balance into `count` monthly
/// installments.
///
/// ## Rules
/// - `1 <= count <= 12`
/// - fails with [`CoreError::NothingToSchedule`] when nothing remains
/// - amounts are `floor(available / count)` with the remainder folded into
///   the last installment, so the parts sum exactly to the balance at call
///   time
/// - due dates are today + 1..count months; sequences continue from the
///   current maximum
pub fn generate_schedule(
    order: &Order,
    installments: &[Installment],
    count: u32,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> CoreResult<Vec<Installment>> {
    validate_installment_count(count)?;

    let available = available_to_schedule(order, installments);
    if available.is_zero() {
        return Err(CoreError::NothingToSchedule {
            available_cents: available.cents(),
        });
    }

    let first_sequence = next_sequence(installments);
    let parts = available.split_even(count);

    parts
        .into_iter()
        .enumerate()
        .map(|(index, amount)| {
            Ok(Installment {
                id: Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                sequence: first_sequence + index as i64,
                amount_cents: amount.cents(),
                due_date: months_from(today, index as u32 + 1)?,
                paid_at: None,
                method: None,
                notes: None,
                created_at: now,
                updated_at: now,
            })
        })
        .collect()
}

/// `today` shifted forward by `months` whole months.
fn months_from(today: NaiveDate, months: u32) -> CoreResult<NaiveDate> {
    today
        .checked_add_months(Months::new(months))
        .ok_or_else(|| {
            ValidationError::InvalidFormat {
                field: "due_date".to_string(),
                reason: "date arithmetic overflow".to_string(),
            }
            .into()
        })
}

// =============================================================================
// Payment toggle
// =============================================================================

/// Toggles an installment's paid state, moving the order's aggregate in
/// lockstep.
///
/// - Unpaid -> paid: sets `paid_at` to today, adds the amount to
///   `amount_paid`.
/// - Paid -> unpaid: clears `paid_at`, subtracts the amount (floored at
///   zero).
///
/// Toggling twice restores both the installment and the order exactly.
/// This is the only path that keeps the aggregate synchronized with
/// installment-level payments.
pub fn toggle_payment(
    order: &mut Order,
    installment: &mut Installment,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> CoreResult<InstallmentStatus> {
    if installment.order_id != order.id {
        return Err(CoreError::InstallmentNotFound(installment.id.clone()));
    }

    if installment.is_paid() {
        installment.paid_at = None;
        order.amount_paid_cents = (order.amount_paid() - installment.amount())
            .floor_zero()
            .cents();
    } else {
        installment.paid_at = Some(today);
        order.amount_paid_cents = (order.amount_paid() + installment.amount()).cents();
    }

    installment.updated_at = now;
    order.recalculate();
    Ok(installment.status(today))
}

// =============================================================================
// Removal
// =============================================================================

/// Applies the monetary side of removing an installment. The row deletion
/// itself is the persistence layer's job; removal is always allowed.
pub fn apply_removal(
    order: &mut Order,
    installment: &Installment,
    policy: PaidRemovalPolicy,
) -> CoreResult<()> {
    if installment.order_id != order.id {
        return Err(CoreError::InstallmentNotFound(installment.id.clone()));
    }

    if installment.is_paid() && policy == PaidRemovalPolicy::ReversePayment {
        order.amount_paid_cents = (order.amount_paid() - installment.amount())
            .floor_zero()
            .cents();
        order.recalculate();
    }

    Ok(())
}

// =============================================================================
// Summary
// =============================================================================

/// Aggregate view of an order's installments for the order screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentSummary {
    pub paid_count: usize,
    pub pending_count: usize,
    pub overdue_count: usize,
    pub total_paid_cents: i64,
    /// Σ amount of unpaid installments (pending and overdue).
    pub total_pending_cents: i64,
}

impl InstallmentSummary {
    #[inline]
    pub fn total_paid(&self) -> Money {
        Money::from_cents(self.total_paid_cents)
    }

    #[inline]
    pub fn total_pending(&self) -> Money {
        Money::from_cents(self.total_pending_cents)
    }
}

/// Summarizes installments by derived status as of `today`.
pub fn summarize(installments: &[Installment], today: NaiveDate) -> InstallmentSummary {
    let mut summary = InstallmentSummary {
        paid_count: 0,
        pending_count: 0,
        overdue_count: 0,
        total_paid_cents: 0,
        total_pending_cents: 0,
    };

    for installment in installments {
        match installment.status(today) {
            InstallmentStatus::Paid => {
                summary.paid_count += 1;
                summary.total_paid_cents += installment.amount_cents;
            }
            InstallmentStatus::Overdue => {
                summary.overdue_count += 1;
                summary.total_pending_cents += installment.amount_cents;
            }
            InstallmentStatus::Pending => {
                summary.pending_count += 1;
                summary.total_pending_cents += installment.amount_cents;
            }
        }
    }

    summary
}

// =============================================================================
// Unit Tests
// =============================================================================
