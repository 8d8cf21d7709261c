//! PostgreSQL run ledger
//!
//! Runs are stored in the `export_runs` table created by
//! `migrations/001_export_runs.sql`.

pub mod client;
pub mod models;
pub mod store;

pub use client::PostgreSQLClient;
pub use store::PostgreSQLRunStore;
