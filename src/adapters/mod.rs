//! External system integrations.
//!
//! - [`clickhouse`] - Analytical store over the ClickHouse HTTP interface
//! - [`ledger`] - Run store abstraction, in-memory store and backend factory
//! - [`postgresql`] - PostgreSQL run store
//!
//! # Design Pattern
//!
//! Adapters isolate external systems behind traits ([`clickhouse::AnalyticalStore`],
//! [`clickhouse::StoreConnector`], [`ledger::RunStore`]) so the workflow can be
//! exercised against in-process fakes.
//!
//! ```rust,no_run
//! use batch_export::adapters::clickhouse::{AnalyticalStore, ClickHouseClient};
//! use batch_export::config::ClickHouseConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClickHouseClient::new(ClickHouseConfig::default())?;
//! if !client.is_alive().await {
//!     eprintln!("ClickHouse at {} is unreachable", client.base_url());
//! }
//! # Ok(())
//! # }
//! ```

pub mod clickhouse;
pub mod ledger;
pub mod postgresql;
