//! Run store trait

use crate::domain::ids::{DestinationId, RunId, TeamId};
use crate::domain::run::{CreateRunRequest, ExportRun, RunStatus};
use crate::domain::Result;
use async_trait::async_trait;

/// Persistence for export run records
///
/// Implementations must tolerate concurrent calls from independent runs.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Test the store connection
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn test_connection(&self) -> Result<()>;

    /// Create the schema if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    async fn ensure_schema(&self) -> Result<()>;

    /// Insert a run in status `Starting`
    ///
    /// Replaying a request with the same `request_id` returns the id of the run
    /// the first call created.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ExportError::Integrity`] on a constraint violation and
    /// [`crate::domain::ExportError::LedgerUnavailable`] when the store cannot be reached.
    async fn create_run(&self, request: &CreateRunRequest) -> Result<RunId>;

    /// Overwrite the status of a run
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ExportError::Integrity`] if the run does not exist.
    async fn update_run_status(&self, run_id: &RunId, status: RunStatus) -> Result<()>;

    /// Fetch a run by id
    async fn get_run(&self, run_id: &RunId) -> Result<Option<ExportRun>>;

    /// Most recent runs for a destination, newest first
    async fn list_runs(
        &self,
        team_id: TeamId,
        destination_id: &DestinationId,
        limit: usize,
    ) -> Result<Vec<ExportRun>>;
}
