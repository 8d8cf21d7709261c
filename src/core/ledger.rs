//! Run ledger
//!
//! Thin layer over a [`RunStore`] that enforces the run lifecycle: runs are
//! created in `Starting` and only ever moved to a terminal status.

use crate::adapters::ledger::RunStore;
use crate::domain::ids::{DestinationId, RunId, TeamId};
use crate::domain::run::{CreateRunRequest, ExportRun, RunStatus};
use crate::domain::{ExportError, Result};
use std::sync::Arc;

/// Records export runs
#[derive(Clone)]
pub struct RunLedger {
    store: Arc<dyn RunStore>,
}

impl RunLedger {
    /// Create a ledger over `store`
    pub fn new(store: Arc<dyn RunStore>) -> Self {
        Self { store }
    }

    /// Records a new run in `Starting`
    ///
    /// Safe to retry with the same request: the run created by the first
    /// successful call is returned.
    pub async fn create_run(&self, request: &CreateRunRequest) -> Result<RunId> {
        let run_id = self.store.create_run(request).await?;

        tracing::info!(
            run_id = %run_id,
            team_id = %request.team_id,
            destination_id = %request.destination_id,
            interval = %request.interval,
            "Export run created"
        );

        Ok(run_id)
    }

    /// Moves a run to a terminal status
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Internal`] for a non-terminal status.
    pub async fn update_run_status(&self, run_id: &RunId, status: RunStatus) -> Result<()> {
        if !status.is_terminal() {
            return Err(ExportError::Internal(format!(
                "Refusing to move run {run_id} back to {status}"
            )));
        }

        self.store.update_run_status(run_id, status).await?;
        tracing::info!(run_id = %run_id, status = %status, "Export run finalized");
        Ok(())
    }

    /// Fetch a run
    pub async fn get_run(&self, run_id: &RunId) -> Result<Option<ExportRun>> {
        self.store.get_run(run_id).await
    }

    /// Most recent runs for a destination
    pub async fn list_runs(
        &self,
        team_id: TeamId,
        destination_id: &DestinationId,
        limit: usize,
    ) -> Result<Vec<ExportRun>> {
        self.store.list_runs(team_id, destination_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ledger::MemoryRunStore;
    use crate::domain::interval::{parse_instant, DataInterval};

    fn request() -> CreateRunRequest {
        let end = parse_instant("2024-01-01T01:00:00Z").unwrap();
        CreateRunRequest::new(
            TeamId::new(1),
            DestinationId::new("dest").unwrap(),
            None,
            DataInterval::ending_at(end, 3600).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let ledger = RunLedger::new(Arc::new(MemoryRunStore::new()));
        let run_id = ledger.create_run(&request()).await.unwrap();

        ledger
            .update_run_status(&run_id, RunStatus::Completed)
            .await
            .unwrap();

        let run = ledger.get_run(&run_id).await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_rejects_non_terminal_update() {
        let ledger = RunLedger::new(Arc::new(MemoryRunStore::new()));
        let run_id = ledger.create_run(&request()).await.unwrap();

        let err = ledger
            .update_run_status(&run_id, RunStatus::Starting)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Internal(_)));
    }

    #[tokio::test]
    async fn test_repeated_terminal_update_is_safe() {
        let ledger = RunLedger::new(Arc::new(MemoryRunStore::new()));
        let run_id = ledger.create_run(&request()).await.unwrap();

        for _ in 0..2 {
            ledger
                .update_run_status(&run_id, RunStatus::Failed)
                .await
                .unwrap();
        }
        let run = ledger.get_run(&run_id).await.unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
    }
}
