//! # Return Repository
//!
//! Persistence for the append-only return ledger.
//!
//! One `record` call validates every requested item against its live
//! pending-quantity ceiling and then inserts one event row per item, all in
//! a single transaction - either the whole return lands or none of it does.
//!
//! There is no update or delete surface here on purpose: the ledger is
//! append-only, and aggregates are recomputed from the full event list on
//! every read.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::order::fetch_order_by_number;
use marquee_core::returns::{self, ReturnRequest, ReturnSummaryLine};
use marquee_core::ReturnEvent;

const EVENT_COLUMNS: &str =
    "id, order_number, product_name, quantity, responsible, notes, returned_at";

/// Repository for return-ledger database operations.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    /// Creates a new ReturnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// All return events for an order, oldest first.
    pub async fn list_for_order(&self, order_number: i64) -> DbResult<Vec<ReturnEvent>> {
        let mut conn = self.pool.acquire().await?;
        fetch_for_order(&mut conn, order_number).await
    }

    /// Records a return: validates the request against the current ledger
    /// and appends one event per affected item.
    ///
    /// Atomic per call - if any item exceeds its pending ceiling, no events
    /// are recorded for any item.
    pub async fn record(
        &self,
        order_number: i64,
        request: &ReturnRequest,
    ) -> DbResult<Vec<ReturnEvent>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let order = fetch_order_by_number(&mut tx, order_number)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_number.to_string()))?;
        let existing = fetch_for_order(&mut tx, order_number).await?;

        let events = returns::record(&order, &existing, request, now)?;

        debug!(
            order_number,
            items = events.len(),
            responsible = %request.responsible,
            "Recording return"
        );

        for event in &events {
            sqlx::query(
                "INSERT INTO return_events (
                    id, order_number, product_name, quantity, responsible,
                    notes, returned_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&event.id)
            .bind(event.order_number)
            .bind(&event.product_name)
            .bind(event.quantity)
            .bind(&event.responsible)
            .bind(&event.notes)
            .bind(event.returned_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(events)
    }

    /// Per-product return summary for the order view, recomputed from the
    /// full event list.
    pub async fn summary(&self, order_number: i64) -> DbResult<Vec<ReturnSummaryLine>> {
        let mut conn = self.pool.acquire().await?;

        let order = fetch_order_by_number(&mut conn, order_number)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_number.to_string()))?;
        let events = fetch_for_order(&mut conn, order_number).await?;

        Ok(returns::summarize(&order, &events))
    }

    /// Whether any line item still has units out with the customer.
    pub async fn has_pending(&self, order_number: i64) -> DbResult<bool> {
        Ok(self
            .summary(order_number)
            .await?
            .iter()
            .any(|line| line.pending > 0))
    }
}

async fn fetch_for_order(
    conn: &mut SqliteConnection,
    order_number: i64,
) -> DbResult<Vec<ReturnEvent>> {
    let events = sqlx::query_as::<_, ReturnEvent>(&format!(
        "SELECT {EVENT_COLUMNS} FROM return_events WHERE order_number = ?1 ORDER BY returned_at, id"
    ))
    .bind(order_number)
    .fetch_all(&mut *conn)
    .await?;

    Ok(events)
}

// =============================================================================
// Unit Tests
// =============================================================================
