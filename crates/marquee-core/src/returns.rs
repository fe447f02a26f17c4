//! # Return Ledger
//!
//! Aggregates return events per order and validates new return recordings.
//!
//! ## Ledger Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Order #42: Toalha x5                                               │
//! │                                                                     │
//! │  ReturnEvent { order: 42, product: "Toalha", qty: 3 }               │
//! │  ReturnEvent { order: 42, product: "Toalha", qty: 1 }               │
//! │                                                                     │
//! │  returned = 3 + 1 = 4      pending = max(0, 5 - 4) = 1              │
//! │  status   = PartiallyReturned                                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger is read-heavy: every aggregate is recomputed from the full
//! event list for the order. No running counter lives on the order, so
//! there is no second source of truth to drift.
//!
//! Events are append-only. A correction is another event, never an edit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::order::Order;
use crate::types::{ReturnEvent, ReturnStatus};
use crate::validation::validate_responsible;

// =============================================================================
// Return Request
// =============================================================================

/// One product line of a return being recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequestItem {
    pub product_name: String,
    pub quantity: i64,
}

/// A return recording: one or more products coming back in one physical
/// hand-over, attributed to the person who received them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub items: Vec<ReturnRequestItem>,
    pub responsible: String,
    pub notes: Option<String>,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Total quantity of a product already returned on an order.
pub fn returned_quantity(order: &Order, events: &[ReturnEvent], product_name: &str) -> i64 {
    events
        .iter()
        .filter(|event| {
            event.order_number == order.order_number && event.product_name == product_name
        })
        .map(|event| event.quantity)
        .sum()
}

/// Total quantity of a product on the order's line items (all rows with the
/// name, bundle-sourced or not; placeholders excluded).
pub fn ordered_quantity(order: &Order, product_name: &str) -> i64 {
    order
        .items
        .iter()
        .filter(|item| !item.is_placeholder() && item.name == product_name)
        .map(|item| item.quantity)
        .sum()
}

/// Quantity still out with the customer: `max(0, ordered - returned)`.
pub fn pending_quantity(order: &Order, events: &[ReturnEvent], product_name: &str) -> i64 {
    (ordered_quantity(order, product_name) - returned_quantity(order, events, product_name)).max(0)
}

/// Classifies a product's return state from its ordered and returned
/// quantities.
pub fn item_status(ordered: i64, returned: i64) -> ReturnStatus {
    if (ordered - returned).max(0) == 0 {
        ReturnStatus::FullyReturned
    } else if returned > 0 {
        ReturnStatus::PartiallyReturned
    } else {
        ReturnStatus::NotReturned
    }
}

/// One product row of an order's return summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnSummaryLine {
    pub product_name: String,
    pub ordered: i64,
    pub returned: i64,
    pub pending: i64,
    pub status: ReturnStatus,
}

/// Summarizes return state per distinct product on the order, in first-seen
/// line-item order.
pub fn summarize(order: &Order, events: &[ReturnEvent]) -> Vec<ReturnSummaryLine> {
    let mut lines: Vec<ReturnSummaryLine> = Vec::new();

    for item in order.items.iter().filter(|item| !item.is_placeholder()) {
        if lines.iter().any(|line| line.product_name == item.name) {
            continue;
        }

        let ordered = ordered_quantity(order, &item.name);
        let returned = returned_quantity(order, events, &item.name);
        lines.push(ReturnSummaryLine {
            product_name: item.name.clone(),
            ordered,
            returned,
            pending: (ordered - returned).max(0),
            status: item_status(ordered, returned),
        });
    }

    lines
}

/// Whether any line item still has units out with the customer.
pub fn has_pending_returns(order: &Order, events: &[ReturnEvent]) -> bool {
    summarize(order, events).iter().any(|line| line.pending > 0)
}

// =============================================================================
// Recording
// =============================================================================

/// Validates a return request against the current ledger and produces the
/// events to append - one per affected item.
///
/// ## Rules
/// - `responsible` must not be blank
/// - the item list must not be empty, and every quantity must be positive
/// - each item's requested quantity must not exceed that product's current
///   pending quantity (the ceiling is recomputed from existing events, per
///   item, per call)
///
/// Validation is atomic: if any item fails, no events are produced for any
/// item in the call.
pub fn record(
    order: &Order,
    events: &[ReturnEvent],
    request: &ReturnRequest,
    now: DateTime<Utc>,
) -> CoreResult<Vec<ReturnEvent>> {
    validate_responsible(&request.responsible)?;

    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }

    // Validate everything before building anything.
    for item in &request.items {
        if item.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("quantity for '{}'", item.product_name),
            }
            .into());
        }

        let pending = pending_quantity(order, events, &item.product_name);
        if item.quantity > pending {
            return Err(CoreError::ReturnExceedsPending {
                product: item.product_name.clone(),
                pending,
                requested: item.quantity,
            });
        }
    }

    Ok(request
        .items
        .iter()
        .map(|item| ReturnEvent {
            id: Uuid::new_v4().to_string(),
            order_number: order.order_number,
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            responsible: request.responsible.trim().to_string(),
            notes: request.notes.clone(),
            returned_at: now,
        })
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
