//! Analytical store abstraction
//!
//! The export activity only needs three operations from the store. Keeping them
//! behind a trait lets the workflow run against an in-process fake in tests.

use super::statement::Statement;
use crate::domain::Result;
use async_trait::async_trait;

/// A live session with the analytical store
#[async_trait]
pub trait AnalyticalStore: Send + Sync {
    /// Whether the store answers its liveness probe
    async fn is_alive(&self) -> bool;

    /// Runs a statement returning a single count, `None` when the result is absent
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails or the result is not a count.
    async fn fetch_count(&self, statement: &Statement) -> Result<Option<u64>>;

    /// Runs a statement that returns no rows
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    async fn execute(&self, statement: &Statement) -> Result<()>;
}

/// Opens store sessions
///
/// One session is opened per export attempt and dropped when the attempt ends.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Opens a new session
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be created.
    async fn connect(&self) -> Result<Box<dyn AnalyticalStore>>;
}
