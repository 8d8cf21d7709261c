//! Export activity
//!
//! One attempt at exporting a window: build the query, open a store session,
//! run the row-count guard and, if the window holds rows, issue the bulk
//! export. Retries happen outside, in the worker pool.

use crate::adapters::clickhouse::StoreConnector;
use crate::core::guard::{GuardDecision, RowCountGuard};
use crate::core::query::{ExtractionQuery, ObjectStorageEndpoint};
use crate::domain::interval::DataInterval;
use crate::domain::spec::ExportSpec;
use crate::domain::Result;
use std::sync::Arc;
use std::time::Instant;

/// Inputs of one export attempt
#[derive(Debug, Clone)]
pub struct ExportActivityInputs {
    /// Workflow inputs
    pub spec: ExportSpec,

    /// Resolved window
    pub interval: DataInterval,
}

/// Result of a successful export attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The window was empty; nothing was written
    Skipped,
    /// Rows were written to `destination_url`
    Exported { rows: u64, destination_url: String },
}

impl ExportOutcome {
    /// Rows written, zero when skipped
    pub fn rows(&self) -> u64 {
        match self {
            ExportOutcome::Skipped => 0,
            ExportOutcome::Exported { rows, .. } => *rows,
        }
    }
}

/// Exports one window from the analytical store to object storage
pub struct ExportActivity {
    connector: Arc<dyn StoreConnector>,
    endpoint: ObjectStorageEndpoint,
}

impl ExportActivity {
    /// Create an activity writing through `endpoint`
    pub fn new(connector: Arc<dyn StoreConnector>, endpoint: ObjectStorageEndpoint) -> Self {
        Self {
            connector,
            endpoint,
        }
    }

    /// Object storage endpoint exports are addressed to
    pub fn endpoint(&self) -> &ObjectStorageEndpoint {
        &self.endpoint
    }

    /// Runs a single export attempt
    ///
    /// Re-running with the same inputs writes the same destination key, so a
    /// retried attempt overwrites rather than duplicates.
    ///
    /// # Errors
    ///
    /// Configuration faults for an unsupported table or partition key,
    /// [`crate::domain::ExportError::Connection`] when the store is down, and any
    /// statement failure.
    pub async fn execute(&self, inputs: &ExportActivityInputs) -> Result<ExportOutcome> {
        let started = Instant::now();

        tracing::info!(
            team_id = %inputs.spec.team_id,
            interval = %inputs.interval,
            "Running export batch"
        );

        let query = ExtractionQuery::build(&inputs.interval, &inputs.spec, &self.endpoint)?;
        let store = self.connector.connect().await?;

        let rows = match RowCountGuard::check(store.as_ref(), &query).await? {
            GuardDecision::Skip => {
                tracing::info!(
                    interval = %inputs.interval,
                    "Nothing to export in batch"
                );
                return Ok(ExportOutcome::Skipped);
            }
            GuardDecision::Export { rows } => rows,
        };

        tracing::info!(
            rows = rows,
            table = query.table_name(),
            destination = %query.destination_url(),
            partition = ?query.partition_clause(),
            "Exporting rows to object storage"
        );

        store.execute(&query.export_statement()).await?;

        let outcome = ExportOutcome::Exported {
            rows,
            destination_url: query.destination_url().to_string(),
        };
        crate::log_export_complete!(inputs.interval, Some(rows), started.elapsed());

        Ok(outcome)
    }
}
