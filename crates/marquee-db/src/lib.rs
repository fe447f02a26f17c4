//! # marquee-db: Database Layer for Marquee Rentals
//!
//! SQLite persistence for the reconciliation engine, using sqlx for async
//! operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Marquee Rentals Data Flow                       │
//! │                                                                     │
//! │  Caller (order screen, seed tooling, tests)                         │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                   marquee-db (THIS CRATE)                     │ │
//! │  │                                                               │ │
//! │  │  ┌────────────┐   ┌───────────────┐   ┌────────────────┐     │ │
//! │  │  │  Database  │   │ Repositories  │   │   Migrations   │     │ │
//! │  │  │ (pool.rs)  │◄──│ orders, ...   │   │   (embedded)   │     │ │
//! │  │  └────────────┘   └───────────────┘   └────────────────┘     │ │
//! │  │                                                               │ │
//! │  │  Multi-record reconciliation writes run inside single         │ │
//! │  │  transactions (toggle payment, record return, add bundle).    │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database (WAL mode, foreign keys on)                        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use marquee_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/marquee.db")).await?;
//!
//! let mut order = db.orders().create("Ana Souza", "ana").await?;
//! order.add_item("Toalha Redonda", 5, Money::from_cents(1_200))?;
//! db.orders().save(&mut order, "ana").await?;
//!
//! let schedule = db.installments().generate_schedule(&order.id, 3, "ana").await?;
//! db.installments().toggle_payment(&schedule[0].id, "ana").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::bundle::{BundleQuote, BundleRepository};
pub use repository::catalog::CatalogRepository;
pub use repository::installment::InstallmentRepository;
pub use repository::order::OrderRepository;
pub use repository::returns::ReturnRepository;
