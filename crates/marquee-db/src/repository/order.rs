//! # Order Repository
//!
//! Whole-record persistence for orders and their line items.
//!
//! ## Persistence Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  orders        1 ──── n   order_items                               │
//! │                                                                     │
//! │  save() semantics: whole-record upsert                              │
//! │    UPDATE orders SET <all scalar columns>                           │
//! │    DELETE FROM order_items WHERE order_id = ?                       │
//! │    INSERT one row per current line item (position preserved)        │
//! │    ... all in one transaction                                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The order's `order_number` business key is allocated as `MAX + 1` inside
//! the insert transaction, so numbers are unique and monotonic.
//!
//! The `fetch_*`/`update_*` helpers operate on a raw connection so the
//! installment, return and bundle repositories can reuse them inside their
//! own transactions.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use marquee_core::{Discount, LineItem, Money, Order, Percent};

// =============================================================================
// Row Mapping
// =============================================================================

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_phone, customer_address, \
     discount_kind, discount_value, gross_total_cents, discount_cents, final_amount_cents, \
     amount_paid_cents, amount_due_cents, notes, last_modified_by, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, name, quantity, unit_price_cents, total_cents, bundle_name";

/// Scalar columns of the orders table. Line items are loaded separately and
/// the discount enum is rebuilt from its (kind, value) column pair.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: i64,
    customer_name: String,
    customer_phone: Option<String>,
    customer_address: Option<String>,
    discount_kind: String,
    discount_value: i64,
    gross_total_cents: i64,
    discount_cents: i64,
    final_amount_cents: i64,
    amount_paid_cents: i64,
    amount_due_cents: i64,
    notes: Option<String>,
    last_modified_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<LineItem>) -> DbResult<Order> {
        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_address: self.customer_address,
            items,
            discount: discount_from_columns(&self.discount_kind, self.discount_value)?,
            gross_total_cents: self.gross_total_cents,
            discount_cents: self.discount_cents,
            final_amount_cents: self.final_amount_cents,
            amount_paid_cents: self.amount_paid_cents,
            amount_due_cents: self.amount_due_cents,
            notes: self.notes,
            last_modified_by: self.last_modified_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Flattens the discount spec into its (kind, value) column pair. The value
/// column holds cents for fixed discounts and basis points for percentages.
fn discount_to_columns(discount: &Discount) -> (&'static str, i64) {
    match discount {
        Discount::None => ("none", 0),
        Discount::Fixed(amount) => ("fixed", amount.cents()),
        Discount::Percentage(rate) => ("percentage", rate.bps() as i64),
    }
}

fn discount_from_columns(kind: &str, value: i64) -> DbResult<Discount> {
    match kind {
        "none" => Ok(Discount::None),
        "fixed" => Ok(Discount::Fixed(Money::from_cents(value))),
        "percentage" => Ok(Discount::Percentage(Percent::from_bps(value as u32))),
        other => Err(DbError::Internal(format!("unknown discount kind '{other}'"))),
    }
}

// =============================================================================
// Connection-Level Helpers (shared with the orchestrating repositories)
// =============================================================================

pub(crate) async fn fetch_order_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let items = fetch_items(conn, &row.id).await?;
            Ok(Some(row.into_order(items)?))
        }
        None => Ok(None),
    }
}

pub(crate) async fn fetch_order_by_number(
    conn: &mut SqliteConnection,
    order_number: i64,
) -> DbResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ?1"
    ))
    .bind(order_number)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let items = fetch_items(conn, &row.id).await?;
            Ok(Some(row.into_order(items)?))
        }
        None => Ok(None),
    }
}

async fn fetch_items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<LineItem>> {
    let items = sqlx::query_as::<_, LineItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY position"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

pub(crate) async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    let (discount_kind, discount_value) = discount_to_columns(&order.discount);

    sqlx::query(
        "INSERT INTO orders (
            id, order_number, customer_name, customer_phone, customer_address,
            discount_kind, discount_value,
            gross_total_cents, discount_cents, final_amount_cents,
            amount_paid_cents, amount_due_cents,
            notes, last_modified_by, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
    )
    .bind(&order.id)
    .bind(order.order_number)
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(&order.customer_address)
    .bind(discount_kind)
    .bind(discount_value)
    .bind(order.gross_total_cents)
    .bind(order.discount_cents)
    .bind(order.final_amount_cents)
    .bind(order.amount_paid_cents)
    .bind(order.amount_due_cents)
    .bind(&order.notes)
    .bind(&order.last_modified_by)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    replace_items(conn, order).await
}

/// Updates the scalar columns of the order row. Used alone by the
/// installment reconciler (which never touches line items) and as the first
/// half of the whole-record upsert.
pub(crate) async fn update_order_row(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    let (discount_kind, discount_value) = discount_to_columns(&order.discount);

    let result = sqlx::query(
        "UPDATE orders SET
            customer_name = ?2, customer_phone = ?3, customer_address = ?4,
            discount_kind = ?5, discount_value = ?6,
            gross_total_cents = ?7, discount_cents = ?8, final_amount_cents = ?9,
            amount_paid_cents = ?10, amount_due_cents = ?11,
            notes = ?12, last_modified_by = ?13, updated_at = ?14
         WHERE id = ?1",
    )
    .bind(&order.id)
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(&order.customer_address)
    .bind(discount_kind)
    .bind(discount_value)
    .bind(order.gross_total_cents)
    .bind(order.discount_cents)
    .bind(order.final_amount_cents)
    .bind(order.amount_paid_cents)
    .bind(order.amount_due_cents)
    .bind(&order.notes)
    .bind(&order.last_modified_by)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order", &order.id));
    }

    Ok(())
}

async fn replace_items(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    sqlx::query("DELETE FROM order_items WHERE order_id = ?1")
        .bind(&order.id)
        .execute(&mut *conn)
        .await?;

    for (position, item) in order.items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO order_items (
                id, order_id, name, quantity, unit_price_cents, total_cents,
                bundle_name, position
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&item.id)
        .bind(&order.id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.total_cents)
        .bind(&item.bundle_name)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Whole-record upsert: scalar columns plus a full replace of the item
/// rows.
pub(crate) async fn upsert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    update_order_row(conn, order).await?;
    replace_items(conn, order).await
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates a new order with the next sequential order number and a
    /// single empty placeholder line item.
    pub async fn create(&self, customer_name: &str, actor: &str) -> DbResult<Order> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let next_number: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(order_number), 0) + 1 FROM orders")
                .fetch_one(&mut *tx)
                .await?;

        let order = Order::new(next_number, customer_name, actor, now)?;

        debug!(order_number = order.order_number, "Creating order");
        insert_order(&mut tx, &order).await?;
        tx.commit().await?;

        Ok(order)
    }

    /// Loads an order by its business number, line items included.
    pub async fn load(&self, order_number: i64) -> DbResult<Order> {
        let mut conn = self.pool.acquire().await?;
        fetch_order_by_number(&mut conn, order_number)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_number.to_string()))
    }

    /// Loads an order by its UUID.
    pub async fn load_by_id(&self, id: &str) -> DbResult<Order> {
        let mut conn = self.pool.acquire().await?;
        fetch_order_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Persists an order with whole-record upsert semantics, stamping
    /// attribution.
    ///
    /// The caller mutates the order through its core methods (which keep
    /// the derived money columns consistent) and hands it here to land.
    pub async fn save(&self, order: &mut Order, actor: &str) -> DbResult<()> {
        order.touch(actor, Utc::now());

        debug!(order_number = order.order_number, "Saving order");
        let mut tx = self.pool.begin().await?;
        upsert_order(&mut tx, order).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Most recent orders first, line items included.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY order_number DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = fetch_items(&mut conn, &row.id).await?;
            orders.push(row.into_order(items)?);
        }

        Ok(orders)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use marquee_core::discount::Discount;
    use marquee_core::money::{Money, Percent};

    #[tokio::test]
    async fn create_allocates_sequential_numbers() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let orders = db.orders();

        let first = orders.create("Ana Souza", "operator").await.unwrap();
        let second = orders.create("Bruno Lima", "operator").await.unwrap();

        assert_eq!(first.order_number, 1);
        assert_eq!(second.order_number, 2);
        assert_eq!(first.items.len(), 1);
        assert!(first.items[0].is_placeholder());
    }

    #[tokio::test]
    async fn save_and_load_round_trips_the_whole_record() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let orders = db.orders();

        let mut order = orders.create("Ana Souza", "operator").await.unwrap();
        order.add_item("Toalha", 5, Money::from_cents(1_200)).unwrap();
        order
            .set_discount(Discount::Percentage(Percent::from_percentage(10.0)))
            .unwrap();
        orders.save(&mut order, "ana").await.unwrap();

        let loaded = orders.load(order.order_number).await.unwrap();
        assert_eq!(loaded.id, order.id);
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.gross_total_cents, 6_000);
        assert_eq!(loaded.discount_cents, 600);
        assert_eq!(loaded.final_amount_cents, 5_400);
        assert_eq!(loaded.amount_due_cents, 5_400);
        assert_eq!(loaded.discount, order.discount);
        assert_eq!(loaded.last_modified_by, "ana");
    }

    #[tokio::test]
    async fn load_unknown_number_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.orders().load(999).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn item_positions_survive_the_upsert() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let orders = db.orders();

        let mut order = orders.create("Ana Souza", "operator").await.unwrap();
        order.add_item("Mesa", 1, Money::from_cents(5_000)).unwrap();
        order.add_item("Taça", 10, Money::from_cents(150)).unwrap();
        orders.save(&mut order, "ana").await.unwrap();

        let loaded = orders.load(order.order_number).await.unwrap();
        let names: Vec<&str> = loaded.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["", "Mesa", "Taça"]);
    }
}
