//! # Refugio Database Crate
//!
//! The shelter's permanent record of cases, shelter homes, donors, donations, providers and
//! expenses.
//!
//! ## Architectural Principles
//!
//! - **Layer 2 Adapter:** Everything above this crate talks to the `Ledger` trait. The SQL and
//!   the in-memory tables stay behind it.
//! - **Runtime Queries:** `DbRepository` builds its statements with `sqlx::QueryBuilder` and binds
//!   every filter value, so the crate compiles without a live database.
//! - **Asynchronous & Pooled:** All operations are asynchronous and share one `PgPool`.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: pool set-up and the embedded schema migrations.
//! - `Ledger` and its query structs (`CaseQuery`, `DonationQuery`, ...).
//! - `DbRepository`: the PostgreSQL implementation.
//! - `MemoryLedger`: the in-process implementation used by tests and demos.
//! - `DbError`: the specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod repository;

pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use ledger::{
    CaseQuery, DonationQuery, DonorQuery, ExpenseQuery, Ledger, ProviderQuery, ShelterHomeQuery,
};
pub use memory::{MemoryLedger, Records};
pub use repository::DbRepository;
