//! ClickHouse adapter
//!
//! The analytical store is reached through its HTTP interface. Statements carry
//! named parameters that are sent as `param_<name>` values and bound server-side
//! through `{name:Type}` placeholders.

pub mod client;
pub mod statement;
pub mod traits;

pub use client::{ClickHouseClient, ClickHouseConnector};
pub use statement::Statement;
pub use traits::{AnalyticalStore, StoreConnector};
