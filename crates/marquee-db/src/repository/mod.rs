//! # Repository Module
//!
//! Database repository implementations for Marquee Rentals.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Caller                                                             │
//! │     │  db.installments().toggle_payment(id, "ana")                  │
//! │     ▼                                                               │
//! │  InstallmentRepository                                              │
//! │     │  BEGIN                                                        │
//! │     │    load installment + order                                   │
//! │     │    marquee_core::installment::toggle_payment(...)             │
//! │     │    UPDATE installments; UPDATE orders                         │
//! │     │  COMMIT                                                       │
//! │     ▼                                                               │
//! │  SQLite Database                                                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories that mutate more than one record (payment toggles, bundle
//! insertion, return recording) run the core rules and all writes inside a
//! single transaction, so a failure anywhere leaves no partial update.
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - product lookups (price, stock)
//! - [`order::OrderRepository`] - order + line-item whole-record persistence
//! - [`bundle::BundleRepository`] - bundle CRUD, quoting, add-to-order
//! - [`installment::InstallmentRepository`] - installment CRUD + reconciliation
//! - [`returns::ReturnRepository`] - append-only return ledger

pub mod bundle;
pub mod catalog;
pub mod installment;
pub mod order;
pub mod returns;
