//! # Bundle Repository
//!
//! Bundle persistence, derived pricing quotes, and the transactional
//! add-to-order path.
//!
//! A bundle's "individual total" and "savings" are never stored - they are
//! derived on read from the current catalog prices, so a price change in
//! the catalog is reflected the next time a bundle is quoted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::catalog::CatalogRepository;
use crate::repository::order::{fetch_order_by_number, upsert_order};
use marquee_core::validation::validate_product_name;
use marquee_core::{Bundle, BundleItem, Order};

const BUNDLE_COLUMNS: &str = "id, name, description, price_cents, is_active, created_at, updated_at";

/// A bundle with its derived pricing, computed against current catalog
/// prices at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleQuote {
    pub bundle: Bundle,
    /// Σ current catalog price × quantity over the members.
    pub individual_total_cents: i64,
    /// `max(0, individual_total - promotional price)`.
    pub savings_cents: i64,
}

/// Repository for bundle database operations.
#[derive(Debug, Clone)]
pub struct BundleRepository {
    pool: SqlitePool,
}

impl BundleRepository {
    /// Creates a new BundleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BundleRepository { pool }
    }

    /// Creates and persists a new active bundle.
    pub async fn create(
        &self,
        name: &str,
        description: Option<String>,
        price_cents: i64,
        items: Vec<BundleItem>,
    ) -> DbResult<Bundle> {
        validate_product_name(name).map_err(marquee_core::CoreError::from)?;

        let now = Utc::now();
        let bundle = Bundle {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description,
            price_cents,
            items,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(name = %bundle.name, "Creating bundle");

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO bundles (id, name, description, price_cents, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&bundle.id)
        .bind(&bundle.name)
        .bind(&bundle.description)
        .bind(bundle.price_cents)
        .bind(bundle.is_active)
        .bind(bundle.created_at)
        .bind(bundle.updated_at)
        .execute(&mut *tx)
        .await?;

        replace_items(&mut tx, &bundle).await?;
        tx.commit().await?;

        Ok(bundle)
    }

    /// Updates a bundle's fields and members (whole-record).
    pub async fn update(&self, bundle: &Bundle) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE bundles SET
                name = ?2, description = ?3, price_cents = ?4, is_active = ?5, updated_at = ?6
             WHERE id = ?1",
        )
        .bind(&bundle.id)
        .bind(&bundle.name)
        .bind(&bundle.description)
        .bind(bundle.price_cents)
        .bind(bundle.is_active)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bundle", &bundle.id));
        }

        replace_items(&mut tx, bundle).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Deactivates a bundle. It stays readable in history but can no
    /// longer be added to orders.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE bundles SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bundle", id));
        }

        Ok(())
    }

    /// Gets a bundle by ID, members included.
    pub async fn get(&self, id: &str) -> DbResult<Bundle> {
        let mut conn = self.pool.acquire().await?;
        fetch_bundle(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Bundle", id))
    }

    /// Lists active bundles, name order.
    pub async fn list_active(&self) -> DbResult<Vec<Bundle>> {
        self.list(true).await
    }

    /// Lists all bundles including deactivated ones, name order.
    pub async fn list_all(&self) -> DbResult<Vec<Bundle>> {
        self.list(false).await
    }

    async fn list(&self, active_only: bool) -> DbResult<Vec<Bundle>> {
        let mut conn = self.pool.acquire().await?;

        let sql = if active_only {
            format!("SELECT {BUNDLE_COLUMNS} FROM bundles WHERE is_active = 1 ORDER BY name")
        } else {
            format!("SELECT {BUNDLE_COLUMNS} FROM bundles ORDER BY name")
        };
        let rows = sqlx::query_as::<_, BundleRow>(&sql)
            .fetch_all(&mut *conn)
            .await?;

        let mut bundles = Vec::with_capacity(rows.len());
        for row in rows {
            let items = fetch_items(&mut conn, &row.id).await?;
            bundles.push(row.into_bundle(items));
        }

        Ok(bundles)
    }

    /// Quotes a bundle against current catalog prices.
    pub async fn quote(&self, id: &str) -> DbResult<BundleQuote> {
        let bundle = self.get(id).await?;

        let names: Vec<String> = bundle
            .items
            .iter()
            .map(|item| item.product_name.clone())
            .collect();
        let prices = CatalogRepository::new(self.pool.clone())
            .prices_for(&names)
            .await?;

        let individual_total = bundle.individual_total(&prices);
        let savings = bundle.savings(&prices);

        Ok(BundleQuote {
            bundle,
            individual_total_cents: individual_total.cents(),
            savings_cents: savings.cents(),
        })
    }

    /// Merges a bundle into an order's line items and persists the updated
    /// order, all in one transaction.
    ///
    /// Fails without touching anything when the bundle is inactive or has
    /// zero member units.
    pub async fn add_to_order(
        &self,
        order_number: i64,
        bundle_id: &str,
        actor: &str,
    ) -> DbResult<Order> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut order = fetch_order_by_number(&mut tx, order_number)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_number.to_string()))?;
        let bundle = fetch_bundle(&mut tx, bundle_id)
            .await?
            .ok_or_else(|| DbError::not_found("Bundle", bundle_id))?;

        order.add_bundle(&bundle)?;
        order.touch(actor, now);

        debug!(
            order_number,
            bundle = %bundle.name,
            "Merging bundle into order"
        );

        upsert_order(&mut tx, &order).await?;
        tx.commit().await?;

        Ok(order)
    }
}

// =============================================================================
// Row Mapping and Connection-Level Helpers
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct BundleRow {
    id: String,
    name: String,
    description: Option<String>,
    price_cents: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BundleRow {
    fn into_bundle(self, items: Vec<BundleItem>) -> Bundle {
        Bundle {
            id: self.id,
            name: self.name,
            description: self.description,
            price_cents: self.price_cents,
            items,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

async fn fetch_bundle(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Bundle>> {
    let row = sqlx::query_as::<_, BundleRow>(&format!(
        "SELECT {BUNDLE_COLUMNS} FROM bundles WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let items = fetch_items(conn, &row.id).await?;
            Ok(Some(row.into_bundle(items)))
        }
        None => Ok(None),
    }
}

async fn fetch_items(conn: &mut SqliteConnection, bundle_id: &str) -> DbResult<Vec<BundleItem>> {
    let items = sqlx::query_as::<_, BundleItem>(
        "SELECT product_name, quantity FROM bundle_items WHERE bundle_id = ?1 ORDER BY rowid",
    )
    .bind(bundle_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

async fn replace_items(conn: &mut SqliteConnection, bundle: &Bundle) -> DbResult<()> {
    sqlx::query("DELETE FROM bundle_items WHERE bundle_id = ?1")
        .bind(&bundle.id)
        .execute(&mut *conn)
        .await?;

    for item in &bundle.items {
        sqlx::query(
            "INSERT INTO bundle_items (id, bundle_id, product_name, quantity)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&bundle.id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use marquee_core::{CoreError, Product};

    fn member(name: &str, quantity: i64) -> BundleItem {
        BundleItem {
            product_name: name.to_string(),
            quantity,
        }
    }

    async fn seed_product(db: &Database, name: &str, price_cents: i64) {
        let now = Utc::now();
        db.catalog()
            .insert(&Product {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                description: None,
                price_cents,
                stock_quantity: 50,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_get_round_trips_members() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bundles();

        let created = repo
            .create("Kit A", None, 3_000, vec![member("X", 2), member("Y", 1)])
            .await
            .unwrap();

        let loaded = repo.get(&created.id).await.unwrap();
        assert_eq!(loaded.name, "Kit A");
        assert_eq!(loaded.items, vec![member("X", 2), member("Y", 1)]);
        assert_eq!(loaded.total_units(), 3);
    }

    #[tokio::test]
    async fn quote_derives_savings_from_current_prices() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_product(&db, "X", 1_500).await;
        seed_product(&db, "Y", 2_000).await;

        let repo = db.bundles();
        let bundle = repo
            .create("Kit A", None, 3_000, vec![member("X", 2), member("Y", 1)])
            .await
            .unwrap();

        let quote = repo.quote(&bundle.id).await.unwrap();
        assert_eq!(quote.individual_total_cents, 5_000);
        assert_eq!(quote.savings_cents, 2_000);

        // Catalog price change is reflected on the next read
        let catalog = db.catalog();
        let mut x = catalog.get_by_name("X").await.unwrap().unwrap();
        x.price_cents = 500;
        catalog.update(&x).await.unwrap();

        let quote = repo.quote(&bundle.id).await.unwrap();
        assert_eq!(quote.individual_total_cents, 3_000);
        assert_eq!(quote.savings_cents, 0);
    }

    #[tokio::test]
    async fn add_to_order_merges_and_persists() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bundles();

        let bundle = repo
            .create("Kit A", None, 3_000, vec![member("X", 2), member("Y", 1)])
            .await
            .unwrap();
        let order = db.orders().create("Ana Souza", "operator").await.unwrap();

        let updated = repo
            .add_to_order(order.order_number, &bundle.id, "ana")
            .await
            .unwrap();
        assert_eq!(updated.gross_total_cents, 3_000);
        assert_eq!(updated.items.len(), 2);

        let reloaded = db.orders().load(order.order_number).await.unwrap();
        assert_eq!(reloaded.items.len(), 2);
        assert_eq!(reloaded.items[0].name, "X");
        assert_eq!(reloaded.items[0].total_cents, 2_000);
        assert_eq!(reloaded.last_modified_by, "ana");
    }

    #[tokio::test]
    async fn deactivated_bundle_cannot_be_added() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bundles();

        let bundle = repo
            .create("Kit A", None, 3_000, vec![member("X", 1)])
            .await
            .unwrap();
        repo.deactivate(&bundle.id).await.unwrap();

        // Still readable in history
        assert!(repo.list_all().await.unwrap().len() == 1);
        assert!(repo.list_active().await.unwrap().is_empty());

        let order = db.orders().create("Ana Souza", "operator").await.unwrap();
        let err = repo
            .add_to_order(order.order_number, &bundle.id, "ana")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::BundleInactive { .. })
        ));

        // Nothing landed
        let reloaded = db.orders().load(order.order_number).await.unwrap();
        assert_eq!(reloaded.gross_total_cents, 0);
    }

    #[tokio::test]
    async fn zero_unit_bundle_is_not_insertable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bundles();

        let bundle = repo.create("Kit Vazio", None, 3_000, vec![]).await.unwrap();
        let order = db.orders().create("Ana Souza", "operator").await.unwrap();

        let err = repo
            .add_to_order(order.order_number, &bundle.id, "ana")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::BundleHasNoUnits { .. })
        ));
    }
}
