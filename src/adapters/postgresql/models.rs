//! Row mapping for the `export_runs` table

use crate::domain::ids::{DestinationId, RunId, TeamId};
use crate::domain::run::{ExportRun, RunStatus};
use crate::domain::{ExportError, Result};
use chrono::{DateTime, Utc};
use std::str::FromStr;
use tokio_postgres::Row;
use uuid::Uuid;

/// Columns selected when reading runs
pub const RUN_COLUMNS: &str = "id, team_id, destination_id, schedule_id, data_interval_start, \
     data_interval_end, status, created_at, last_updated_at";

/// Raw `export_runs` row
#[derive(Debug, Clone)]
pub struct ExportRunRow {
    pub id: Uuid,
    pub team_id: i64,
    pub destination_id: String,
    pub schedule_id: Option<String>,
    pub data_interval_start: DateTime<Utc>,
    pub data_interval_end: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl ExportRunRow {
    /// Read a row selected with [`RUN_COLUMNS`]
    pub fn from_row(row: &Row) -> Result<Self> {
        let column_error =
            |e: tokio_postgres::Error| ExportError::Serialization(format!("Invalid run row: {e}"));

        Ok(Self {
            id: row.try_get("id").map_err(column_error)?,
            team_id: row.try_get("team_id").map_err(column_error)?,
            destination_id: row.try_get("destination_id").map_err(column_error)?,
            schedule_id: row.try_get("schedule_id").map_err(column_error)?,
            data_interval_start: row.try_get("data_interval_start").map_err(column_error)?,
            data_interval_end: row.try_get("data_interval_end").map_err(column_error)?,
            status: row.try_get("status").map_err(column_error)?,
            created_at: row.try_get("created_at").map_err(column_error)?,
            last_updated_at: row.try_get("last_updated_at").map_err(column_error)?,
        })
    }

    /// Convert to the domain record
    pub fn into_domain(self) -> Result<ExportRun> {
        let destination_id =
            DestinationId::new(self.destination_id).map_err(ExportError::Serialization)?;
        let status = RunStatus::from_str(&self.status).map_err(ExportError::Serialization)?;

        Ok(ExportRun {
            id: RunId::from_uuid(self.id),
            team_id: TeamId::new(self.team_id),
            destination_id,
            schedule_id: self.schedule_id,
            data_interval_start: self.data_interval_start,
            data_interval_end: self.data_interval_end,
            status,
            created_at: self.created_at,
            last_updated_at: self.last_updated_at,
        })
    }
}
