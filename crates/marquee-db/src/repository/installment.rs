//! # Installment Repository
//!
//! Installment persistence plus the transactional reconciliation paths.
//!
//! ## Toggle Payment: One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                              │
//! │    load installment, load owning order (with items)                 │
//! │    marquee_core::installment::toggle_payment                        │
//! │      - flips paid_at                                                │
//! │      - moves order.amount_paid in lockstep                          │
//! │      - recomputes order.amount_due                                  │
//! │    UPDATE installments SET paid_at, updated_at                      │
//! │    UPDATE orders      SET amount_paid, amount_due, ...              │
//! │  COMMIT                                                             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The installment row and the order aggregate land together or not at
//! all - a crash between them cannot leave the paid amounts out of sync.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::order::{fetch_order_by_id, update_order_row};
use marquee_core::installment::{self, NewInstallment, PaidRemovalPolicy};
use marquee_core::{Installment, InstallmentSummary, Order};

const INSTALLMENT_COLUMNS: &str =
    "id, order_id, sequence, amount_cents, due_date, paid_at, method, notes, created_at, updated_at";

/// Repository for installment database operations.
#[derive(Debug, Clone)]
pub struct InstallmentRepository {
    pool: SqlitePool,
}

impl InstallmentRepository {
    /// Creates a new InstallmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InstallmentRepository { pool }
    }

    /// All installments for an order, in sequence order.
    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<Installment>> {
        let mut conn = self.pool.acquire().await?;
        fetch_for_order(&mut conn, order_id).await
    }

    /// Gets an installment by ID.
    pub async fn get(&self, id: &str) -> DbResult<Installment> {
        let mut conn = self.pool.acquire().await?;
        fetch_installment(&mut conn, id).await
    }

    /// Adds a single installment to an order, validating against the live
    /// scheduling ceiling.
    pub async fn add(
        &self,
        order_id: &str,
        input: &NewInstallment,
        actor: &str,
    ) -> DbResult<Installment> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut order = require_order(&mut tx, order_id).await?;
        let existing = fetch_for_order(&mut tx, order_id).await?;

        let installment = installment::create(&order, &existing, input, now)?;

        debug!(
            order_number = order.order_number,
            sequence = installment.sequence,
            amount = installment.amount_cents,
            "Adding installment"
        );

        insert_installment(&mut tx, &installment).await?;
        order.touch(actor, now);
        update_order_row(&mut tx, &order).await?;
        tx.commit().await?;

        Ok(installment)
    }

    /// Edits an unpaid installment. The ceiling allows reusing the capacity
    /// this installment already occupies.
    pub async fn edit(
        &self,
        installment_id: &str,
        input: &NewInstallment,
        actor: &str,
    ) -> DbResult<Installment> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let current = fetch_installment(&mut tx, installment_id).await?;
        let mut order = require_order(&mut tx, &current.order_id).await?;
        let existing = fetch_for_order(&mut tx, &current.order_id).await?;

        let updated = installment::edit(&order, &existing, installment_id, input, now)?;

        sqlx::query(
            "UPDATE installments SET
                amount_cents = ?2, due_date = ?3, method = ?4, notes = ?5, updated_at = ?6
             WHERE id = ?1",
        )
        .bind(&updated.id)
        .bind(updated.amount_cents)
        .bind(updated.due_date)
        .bind(updated.method)
        .bind(&updated.notes)
        .bind(updated.updated_at)
        .execute(&mut *tx)
        .await?;

        order.touch(actor, now);
        update_order_row(&mut tx, &order).await?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Splits the remaining schedulable balance into `count` monthly
    /// installments (1 to 12), the last one absorbing the rounding
    /// remainder.
    pub async fn generate_schedule(
        &self,
        order_id: &str,
        count: u32,
        actor: &str,
    ) -> DbResult<Vec<Installment>> {
        let now = Utc::now();
        let today = now.date_naive();
        let mut tx = self.pool.begin().await?;

        let mut order = require_order(&mut tx, order_id).await?;
        let existing = fetch_for_order(&mut tx, order_id).await?;

        let schedule = installment::generate_schedule(&order, &existing, count, today, now)?;

        debug!(
            order_number = order.order_number,
            count = schedule.len(),
            "Generating installment schedule"
        );

        for installment in &schedule {
            insert_installment(&mut tx, installment).await?;
        }

        order.touch(actor, now);
        update_order_row(&mut tx, &order).await?;
        tx.commit().await?;

        Ok(schedule)
    }

    /// Toggles an installment's paid state and moves the order's paid/due
    /// aggregates in the same transaction.
    pub async fn toggle_payment(&self, installment_id: &str, actor: &str) -> DbResult<Installment> {
        let now = Utc::now();
        let today = now.date_naive();
        let mut tx = self.pool.begin().await?;

        let mut installment = fetch_installment(&mut tx, installment_id).await?;
        let mut order = require_order(&mut tx, &installment.order_id).await?;

        installment::toggle_payment(&mut order, &mut installment, today, now)?;

        debug!(
            order_number = order.order_number,
            sequence = installment.sequence,
            paid = installment.is_paid(),
            "Toggling installment payment"
        );

        sqlx::query("UPDATE installments SET paid_at = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&installment.id)
            .bind(installment.paid_at)
            .bind(installment.updated_at)
            .execute(&mut *tx)
            .await?;

        order.touch(actor, now);
        update_order_row(&mut tx, &order).await?;
        tx.commit().await?;

        Ok(installment)
    }

    /// Removes an installment. Always allowed; what happens to the order's
    /// paid aggregate when the installment was paid is the caller's
    /// explicit choice via `policy`.
    pub async fn remove(
        &self,
        installment_id: &str,
        policy: PaidRemovalPolicy,
        actor: &str,
    ) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let installment = fetch_installment(&mut tx, installment_id).await?;
        let mut order = require_order(&mut tx, &installment.order_id).await?;

        installment::apply_removal(&mut order, &installment, policy)?;

        debug!(
            order_number = order.order_number,
            sequence = installment.sequence,
            ?policy,
            "Removing installment"
        );

        sqlx::query("DELETE FROM installments WHERE id = ?1")
            .bind(&installment.id)
            .execute(&mut *tx)
            .await?;

        order.touch(actor, now);
        update_order_row(&mut tx, &order).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Paid/pending/overdue counts and totals for the order view, derived
    /// as of today.
    pub async fn summary(&self, order_id: &str) -> DbResult<InstallmentSummary> {
        let installments = self.list_for_order(order_id).await?;
        Ok(installment::summarize(
            &installments,
            Utc::now().date_naive(),
        ))
    }
}

// =============================================================================
// Connection-Level Helpers
// =============================================================================

async fn require_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Order> {
    fetch_order_by_id(conn, order_id)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))
}

async fn fetch_installment(conn: &mut SqliteConnection, id: &str) -> DbResult<Installment> {
    sqlx::query_as::<_, Installment>(&format!(
        "SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Installment", id))
}

async fn fetch_for_order(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<Installment>> {
    let installments = sqlx::query_as::<_, Installment>(&format!(
        "SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE order_id = ?1 ORDER BY sequence"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(installments)
}

async fn insert_installment(conn: &mut SqliteConnection, installment: &Installment) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO installments (
            id, order_id, sequence, amount_cents, due_date, paid_at,
            method, notes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(&installment.id)
    .bind(&installment.order_id)
    .bind(installment.sequence)
    .bind(installment.amount_cents)
    .bind(installment.due_date)
    .bind(installment.paid_at)
    .bind(installment.method)
    .bind(&installment.notes)
    .bind(installment.created_at)
    .bind(installment.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Months, NaiveDate};
    use marquee_core::money::Money;
    use marquee_core::CoreError;

    async fn order_with_final_9000(db: &Database) -> Order {
        let orders = db.orders();
        let mut order = orders.create("Ana Souza", "operator").await.unwrap();
        order.add_item("Mesa", 2, Money::from_cents(5_000)).unwrap();
        order
            .set_discount(marquee_core::Discount::Percentage(
                marquee_core::Percent::from_percentage(10.0),
            ))
            .unwrap();
        orders.save(&mut order, "operator").await.unwrap();
        order
    }

    fn input(amount_cents: i64) -> NewInstallment {
        NewInstallment {
            amount_cents,
            due_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            method: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn add_respects_the_live_ceiling() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = order_with_final_9000(&db).await;
        let repo = db.installments();

        let first = repo.add(&order.id, &input(4_000), "ana").await.unwrap();
        assert_eq!(first.sequence, 1);

        let err = repo.add(&order.id, &input(5_001), "ana").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InstallmentExceedsBalance { .. })
        ));

        // The failed add left nothing behind
        assert_eq!(repo.list_for_order(&order.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generate_schedule_persists_and_spaces_monthly() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = order_with_final_9000(&db).await;
        let repo = db.installments();

        let schedule = repo.generate_schedule(&order.id, 3, "ana").await.unwrap();
        assert_eq!(schedule.len(), 3);
        assert!(schedule.iter().all(|i| i.amount_cents == 3_000));

        let today = Utc::now().date_naive();
        for (index, installment) in schedule.iter().enumerate() {
            let expected = today
                .checked_add_months(Months::new(index as u32 + 1))
                .unwrap();
            assert_eq!(installment.due_date, expected);
        }

        let listed = repo.list_for_order(&order.id).await.unwrap();
        assert_eq!(listed.len(), 3);
    }

    #[tokio::test]
    async fn toggle_payment_lands_both_records_together() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = order_with_final_9000(&db).await;
        let repo = db.installments();

        let schedule = repo.generate_schedule(&order.id, 3, "ana").await.unwrap();
        let paid = repo.toggle_payment(&schedule[0].id, "ana").await.unwrap();
        assert!(paid.is_paid());

        let reloaded = db.orders().load_by_id(&order.id).await.unwrap();
        assert_eq!(reloaded.amount_paid_cents, 3_000);
        assert_eq!(reloaded.amount_due_cents, 6_000);

        // Toggle back restores both
        let unpaid = repo.toggle_payment(&schedule[0].id, "ana").await.unwrap();
        assert!(!unpaid.is_paid());
        let reloaded = db.orders().load_by_id(&order.id).await.unwrap();
        assert_eq!(reloaded.amount_paid_cents, 0);
        assert_eq!(reloaded.amount_due_cents, 9_000);
    }

    #[tokio::test]
    async fn remove_paid_installment_follows_the_policy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = order_with_final_9000(&db).await;
        let repo = db.installments();

        let first = repo.add(&order.id, &input(2_000), "ana").await.unwrap();
        repo.toggle_payment(&first.id, "ana").await.unwrap();

        // Observed default: money stays received
        repo.remove(&first.id, PaidRemovalPolicy::PreservePaidAmount, "ana")
            .await
            .unwrap();
        let reloaded = db.orders().load_by_id(&order.id).await.unwrap();
        assert_eq!(reloaded.amount_paid_cents, 2_000);
        assert!(repo.list_for_order(&order.id).await.unwrap().is_empty());

        // Explicit reversal path
        let second = repo.add(&order.id, &input(3_000), "ana").await.unwrap();
        repo.toggle_payment(&second.id, "ana").await.unwrap();
        repo.remove(&second.id, PaidRemovalPolicy::ReversePayment, "ana")
            .await
            .unwrap();
        let reloaded = db.orders().load_by_id(&order.id).await.unwrap();
        assert_eq!(reloaded.amount_paid_cents, 2_000);
    }

    #[tokio::test]
    async fn summary_reports_counts_and_pending_total() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = order_with_final_9000(&db).await;
        let repo = db.installments();

        let schedule = repo.generate_schedule(&order.id, 3, "ana").await.unwrap();
        repo.toggle_payment(&schedule[0].id, "ana").await.unwrap();

        let summary = repo.summary(&order.id).await.unwrap();
        assert_eq!(summary.paid_count, 1);
        assert_eq!(summary.pending_count, 2);
        assert_eq!(summary.overdue_count, 0);
        assert_eq!(summary.total_paid_cents, 3_000);
        assert_eq!(summary.total_pending_cents, 6_000);
    }
}
