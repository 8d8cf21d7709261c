//! PostgreSQL implementation of [`RunStore`]

use super::client::PostgreSQLClient;
use super::models::{ExportRunRow, RUN_COLUMNS};
use crate::adapters::ledger::traits::RunStore;
use crate::domain::ids::{DestinationId, RunId, TeamId};
use crate::domain::run::{CreateRunRequest, ExportRun, RunStatus};
use crate::domain::{ExportError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

const INSERT_RUN: &str = r#"
    INSERT INTO export_runs (
        id, request_id, team_id, destination_id, schedule_id,
        data_interval_start, data_interval_end, status
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (request_id) DO UPDATE SET
        last_updated_at = export_runs.last_updated_at
    RETURNING id
"#;

const UPDATE_STATUS: &str = r#"
    UPDATE export_runs
    SET status = $2, last_updated_at = now()
    WHERE id = $1
"#;

/// Run store backed by the `export_runs` table
pub struct PostgreSQLRunStore {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLRunStore {
    /// Create a store over a client
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl RunStore for PostgreSQLRunStore {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_schema().await
    }

    async fn create_run(&self, request: &CreateRunRequest) -> Result<RunId> {
        let new_id = Uuid::new_v4();
        let team_id = request.team_id.value();
        let start = request.interval.start();
        let end = request.interval.end();

        let rows = self
            .client
            .query(
                INSERT_RUN,
                &[
                    &new_id,
                    &request.request_id,
                    &team_id,
                    &request.destination_id.as_str(),
                    &request.schedule_id,
                    &start,
                    &end,
                    &RunStatus::Starting.as_str(),
                ],
            )
            .await?;

        let row = rows.first().ok_or_else(|| {
            ExportError::LedgerUnavailable("Insert into export_runs returned no id".to_string())
        })?;
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| ExportError::Serialization(format!("Invalid run id: {e}")))?;

        if id != new_id {
            tracing::info!(
                run_id = %id,
                request_id = %request.request_id,
                "Export run already created for request"
            );
        }

        Ok(RunId::from_uuid(id))
    }

    async fn update_run_status(&self, run_id: &RunId, status: RunStatus) -> Result<()> {
        let updated = self
            .client
            .execute(UPDATE_STATUS, &[run_id.as_uuid(), &status.as_str()])
            .await?;

        if updated == 0 {
            return Err(ExportError::Integrity(format!(
                "Export run {run_id} does not exist"
            )));
        }

        Ok(())
    }

    async fn get_run(&self, run_id: &RunId) -> Result<Option<ExportRun>> {
        let query = format!("SELECT {RUN_COLUMNS} FROM export_runs WHERE id = $1");
        let rows = self.client.query(&query, &[run_id.as_uuid()]).await?;

        rows.first()
            .map(|row| ExportRunRow::from_row(row).and_then(ExportRunRow::into_domain))
            .transpose()
    }

    async fn list_runs(
        &self,
        team_id: TeamId,
        destination_id: &DestinationId,
        limit: usize,
    ) -> Result<Vec<ExportRun>> {
        let query = format!(
            "SELECT {RUN_COLUMNS} FROM export_runs \
             WHERE team_id = $1 AND destination_id = $2 \
             ORDER BY created_at DESC LIMIT $3"
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = self
            .client
            .query(&query, &[&team_id.value(), &destination_id.as_str(), &limit])
            .await?;

        rows.iter()
            .map(|row| ExportRunRow::from_row(row).and_then(ExportRunRow::into_domain))
            .collect()
    }
}
