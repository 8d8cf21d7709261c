//! Export run records
//!
//! An [`ExportRun`] is the control-plane record of one workflow execution for one
//! data interval. It is created in [`RunStatus::Starting`] before any data moves and
//! receives exactly one terminal update.

use crate::domain::ids::{DestinationId, RunId, TeamId};
use crate::domain::interval::DataInterval;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of an export run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run record created, export not yet finished
    Starting,
    /// Export finished successfully (including empty windows)
    Completed,
    /// Export failed after exhausting its retry policy
    Failed,
}

impl RunStatus {
    /// Whether this status ends the run lifecycle
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    /// Stored representation
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Starting => "Starting",
            RunStatus::Completed => "Completed",
            RunStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Starting" => Ok(RunStatus::Starting),
            "Completed" => Ok(RunStatus::Completed),
            "Failed" => Ok(RunStatus::Failed),
            other => Err(format!("Unknown run status: {other}")),
        }
    }
}

/// Persisted export run record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRun {
    /// Run identifier
    pub id: RunId,

    /// Owning team
    pub team_id: TeamId,

    /// Destination the run exports to
    pub destination_id: DestinationId,

    /// Parent schedule, when the run was started by a schedule
    pub schedule_id: Option<String>,

    /// Inclusive start of the exported window
    pub data_interval_start: DateTime<Utc>,

    /// Exclusive end of the exported window
    pub data_interval_end: DateTime<Utc>,

    /// Current status
    pub status: RunStatus,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub last_updated_at: DateTime<Utc>,
}

/// Inputs for creating a run record
///
/// `request_id` is generated once per workflow execution and reused on every
/// retry, so a replayed create returns the run it already created.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRunRequest {
    /// Idempotency key for this creation request
    pub request_id: Uuid,

    /// Owning team
    pub team_id: TeamId,

    /// Destination identifier
    pub destination_id: DestinationId,

    /// Parent schedule identifier, if any
    pub schedule_id: Option<String>,

    /// Window the run covers
    pub interval: DataInterval,
}

impl CreateRunRequest {
    /// Creates a request with a fresh idempotency key
    pub fn new(
        team_id: TeamId,
        destination_id: DestinationId,
        schedule_id: Option<String>,
        interval: DataInterval,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            team_id,
            destination_id,
            schedule_id,
            interval,
        }
    }
}
