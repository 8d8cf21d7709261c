//! In-memory run store
//!
//! Records live for the life of the process. Used when `ledger_backend = "memory"`
//! and by tests.

use super::traits::RunStore;
use crate::domain::ids::{DestinationId, RunId, TeamId};
use crate::domain::run::{CreateRunRequest, ExportRun, RunStatus};
use crate::domain::{ExportError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    runs: HashMap<RunId, ExportRun>,
    requests: HashMap<Uuid, RunId>,
}

/// Process-local [`RunStore`]
#[derive(Default)]
pub struct MemoryRunStore {
    state: Mutex<MemoryState>,
}

impl MemoryRunStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored runs
    pub async fn len(&self) -> usize {
        self.state.lock().await.runs.len()
    }

    /// Whether no run has been stored
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All stored runs, oldest first
    pub async fn runs(&self) -> Vec<ExportRun> {
        let state = self.state.lock().await;
        let mut runs: Vec<ExportRun> = state.runs.values().cloned().collect();
        runs.sort_by_key(|run| run.created_at);
        runs
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn create_run(&self, request: &CreateRunRequest) -> Result<RunId> {
        let mut state = self.state.lock().await;

        if let Some(run_id) = state.requests.get(&request.request_id) {
            return Ok(*run_id);
        }

        let now = Utc::now();
        let run = ExportRun {
            id: RunId::generate(),
            team_id: request.team_id,
            destination_id: request.destination_id.clone(),
            schedule_id: request.schedule_id.clone(),
            data_interval_start: request.interval.start(),
            data_interval_end: request.interval.end(),
            status: RunStatus::Starting,
            created_at: now,
            last_updated_at: now,
        };

        let run_id = run.id;
        state.requests.insert(request.request_id, run_id);
        state.runs.insert(run_id, run);
        Ok(run_id)
    }

    async fn update_run_status(&self, run_id: &RunId, status: RunStatus) -> Result<()> {
        let mut state = self.state.lock().await;
        let run = state
            .runs
            .get_mut(run_id)
            .ok_or_else(|| ExportError::Integrity(format!("Export run {run_id} does not exist")))?;

        run.status = status;
        run.last_updated_at = Utc::now();
        Ok(())
    }

    async fn get_run(&self, run_id: &RunId) -> Result<Option<ExportRun>> {
        Ok(self.state.lock().await.runs.get(run_id).cloned())
    }

    async fn list_runs(
        &self,
        team_id: TeamId,
        destination_id: &DestinationId,
        limit: usize,
    ) -> Result<Vec<ExportRun>> {
        let state = self.state.lock().await;
        let mut runs: Vec<ExportRun> = state
            .runs
            .values()
            .filter(|run| run.team_id == team_id && &run.destination_id == destination_id)
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        runs.truncate(limit);
        Ok(runs)
    }
}
