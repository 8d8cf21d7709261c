//! Workflow state machine
//!
//! A run moves strictly forward:
//!
//! ```text
//! ResolvingWindow -> CreatingRun -> Exporting -> Finalizing -> Done
//!        |                |    |                      ^    |
//!        |                |    +----------------------+    |
//!        +----------------+--------------------------------+-> DoneFailed
//! ```
//!
//! Failures before a ledger entry exists end the run directly in `DoneFailed`.
//! A run creation interrupted by shutdown goes straight to `Finalizing` once
//! its run id is recovered. Once `Exporting` has been entered, `Finalizing`
//! always follows.

use crate::domain::{ExportError, Result};
use serde::Serialize;
use std::fmt;

/// Phase of an export workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WorkflowState {
    /// Computing the data interval and validating the query
    ResolvingWindow,
    /// Writing the `Starting` ledger entry
    CreatingRun,
    /// Running the export activity
    Exporting,
    /// Writing the terminal ledger status
    Finalizing,
    /// Export and finalization succeeded
    Done,
    /// The run failed at some step
    DoneFailed,
}

impl WorkflowState {
    /// Whether the run has ended
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowState::Done | WorkflowState::DoneFailed)
    }

    /// Whether `next` may follow this state
    pub fn can_transition_to(self, next: WorkflowState) -> bool {
        use WorkflowState::*;

        matches!(
            (self, next),
            (ResolvingWindow, CreatingRun)
                | (ResolvingWindow, DoneFailed)
                | (CreatingRun, Exporting)
                | (CreatingRun, DoneFailed)
                | (CreatingRun, Finalizing)
                | (Exporting, Finalizing)
                | (Finalizing, Done)
                | (Finalizing, DoneFailed)
        )
    }

    /// Name used in logs and reports
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowState::ResolvingWindow => "ResolvingWindow",
            WorkflowState::CreatingRun => "CreatingRun",
            WorkflowState::Exporting => "Exporting",
            WorkflowState::Finalizing => "Finalizing",
            WorkflowState::Done => "Done",
            WorkflowState::DoneFailed => "DoneFailed",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the current state of one run and the path it took
#[derive(Debug, Clone)]
pub struct StateTracker {
    workflow_id: String,
    current: WorkflowState,
    history: Vec<WorkflowState>,
}

impl StateTracker {
    /// Start tracking a run in `ResolvingWindow`
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            current: WorkflowState::ResolvingWindow,
            history: vec![WorkflowState::ResolvingWindow],
        }
    }

    /// Current state
    pub fn current(&self) -> WorkflowState {
        self.current
    }

    /// Every state visited, in order, starting with `ResolvingWindow`
    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    /// Moves to `next`
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Internal`] for a transition the state machine
    /// does not allow.
    pub fn transition(&mut self, next: WorkflowState) -> Result<()> {
        if !self.current.can_transition_to(next) {
            return Err(ExportError::Internal(format!(
                "Invalid workflow transition {} -> {}",
                self.current, next
            )));
        }

        crate::log_run_transition!(self.workflow_id, self.current, next);
        self.current = next;
        self.history.push(next);
        Ok(())
    }

    /// Consumes the tracker, returning the path taken
    pub fn into_history(self) -> Vec<WorkflowState> {
        self.history
    }
}
