//! # Catalog Repository
//!
//! Product lookups for the reconciliation engine: current price and
//! available stock by product name, plus the minimal CRUD the seed tooling
//! needs. There are no catalog screens; this is a data source.

use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use marquee_core::{Money, Product};

/// Repository for catalog lookups.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price_cents, stock_quantity, is_active, created_at, updated_at";

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Gets a product by its business key.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE name = ?1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Current rental price for a product, in cents.
    ///
    /// Used by ordinary line-item editing. Bundle members do NOT use this -
    /// their unit price is computed from the promotional price and frozen
    /// at insertion.
    pub async fn current_price(&self, name: &str) -> DbResult<i64> {
        self.get_by_name(name)
            .await?
            .map(|product| product.price_cents)
            .ok_or_else(|| DbError::not_found("Product", name))
    }

    /// Units currently available for rental.
    pub async fn available_stock(&self, name: &str) -> DbResult<i64> {
        self.get_by_name(name)
            .await?
            .map(|product| product.stock_quantity)
            .ok_or_else(|| DbError::not_found("Product", name))
    }

    /// Current prices for a set of products, keyed by name. Missing
    /// products are simply absent from the map.
    ///
    /// Used to derive a bundle's individual total and savings on read.
    pub async fn prices_for(&self, names: &[String]) -> DbResult<HashMap<String, Money>> {
        let mut prices = HashMap::with_capacity(names.len());

        for name in names {
            if let Some(product) = self.get_by_name(name).await? {
                prices.insert(name.clone(), product.price());
            }
        }

        Ok(prices)
    }

    /// Lists active products ordered by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Case-insensitive substring search on the product name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("%{}%", query);
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE is_active = 1 AND name LIKE ?1
             ORDER BY name LIMIT ?2"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(name = %product.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products (
                id, name, description, price_cents, stock_quantity,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a product by id.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET
                name = ?2, description = ?3, price_cents = ?4,
                stock_quantity = ?5, is_active = ?6, updated_at = ?7
             WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.is_active)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
