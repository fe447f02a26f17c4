//! # Seed Data Generator
//!
//! Populates the database with a development catalog, a couple of bundles
//! and a demo order.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p marquee-db --bin seed
//!
//! # Specify database path
//! cargo run -p marquee-db --bin seed -- --db ./data/marquee.db
//! ```

use chrono::Utc;
use std::env;
use tracing::info;
use uuid::Uuid;

use marquee_core::{BundleItem, Discount, Money, Percent, Product};
use marquee_db::{Database, DbConfig};

/// Rental catalog: (name, price in cents, stock).
const CATALOG: &[(&str, i64, i64)] = &[
    ("Toalha Redonda Branca", 1_200, 80),
    ("Toalha Quadrada Xadrez", 1_000, 60),
    ("Mesa Redonda 8 Lugares", 5_000, 25),
    ("Mesa Retangular", 4_500, 20),
    ("Cadeira Tiffany", 900, 200),
    ("Cadeira Dobrável", 400, 150),
    ("Taça de Champanhe", 150, 300),
    ("Taça de Vinho", 150, 300),
    ("Copo Long Drink", 100, 400),
    ("Prato Raso Porcelana", 200, 250),
    ("Prato de Sobremesa", 150, 250),
    ("Talher Inox (jogo)", 300, 200),
    ("Jarra de Vidro", 600, 40),
    ("Rechaud Inox", 3_500, 15),
    ("Toalha de Renda", 1_800, 30),
    ("Aparador de Madeira", 6_000, 8),
    ("Arranjo Central", 2_500, 40),
    ("Passadeira Vermelha", 4_000, 6),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./data/marquee.db".to_string());
    info!(path = %db_path, "Seeding database");

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;

    seed_catalog(&db).await?;
    seed_bundles(&db).await?;
    seed_demo_order(&db).await?;

    info!("Seed complete");
    db.close().await;
    Ok(())
}

fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|arg| arg == "--db")
        .and_then(|index| args.get(index + 1).cloned())
}

async fn seed_catalog(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = db.catalog();
    let now = Utc::now();
    let mut inserted = 0usize;

    for &(name, price_cents, stock_quantity) in CATALOG {
        if catalog.get_by_name(name).await?.is_some() {
            continue;
        }
        catalog
            .insert(&Product {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                description: None,
                price_cents,
                stock_quantity,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
        inserted += 1;
    }

    info!(inserted, "Catalog seeded");
    Ok(())
}

async fn seed_bundles(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let bundles = db.bundles();
    if !bundles.list_all().await?.is_empty() {
        return Ok(());
    }

    bundles
        .create(
            "Kit Jantar 8 Pessoas",
            Some("Mesa, toalha e lugares completos para oito convidados".to_string()),
            12_000,
            vec![
                BundleItem {
                    product_name: "Mesa Redonda 8 Lugares".to_string(),
                    quantity: 1,
                },
                BundleItem {
                    product_name: "Toalha Redonda Branca".to_string(),
                    quantity: 1,
                },
                BundleItem {
                    product_name: "Cadeira Tiffany".to_string(),
                    quantity: 8,
                },
                BundleItem {
                    product_name: "Prato Raso Porcelana".to_string(),
                    quantity: 8,
                },
                BundleItem {
                    product_name: "Taça de Vinho".to_string(),
                    quantity: 8,
                },
            ],
        )
        .await?;

    bundles
        .create(
            "Kit Brinde",
            Some("Taças e jarra para o brinde".to_string()),
            2_000,
            vec![
                BundleItem {
                    product_name: "Taça de Champanhe".to_string(),
                    quantity: 12,
                },
                BundleItem {
                    product_name: "Jarra de Vidro".to_string(),
                    quantity: 2,
                },
            ],
        )
        .await?;

    info!("Bundles seeded");
    Ok(())
}

async fn seed_demo_order(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let orders = db.orders();
    if orders.list_recent(1).await?.first().is_some() {
        return Ok(());
    }

    let mut order = orders.create("Cliente Demonstração", "seed").await?;
    order.add_item("Toalha Redonda Branca", 5, Money::from_cents(1_200))?;
    order.add_item("Taça de Champanhe", 24, Money::from_cents(150))?;
    order.set_discount(Discount::Percentage(Percent::from_percentage(10.0)))?;
    orders.save(&mut order, "seed").await?;

    db.installments()
        .generate_schedule(&order.id, 3, "seed")
        .await?;

    info!(order_number = order.order_number, "Demo order seeded");
    Ok(())
}
