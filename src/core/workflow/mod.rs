//! Export workflow engine
//!
//! - [`orchestrator`] - the run state machine and its report
//! - [`pool`] - bounded worker pool with timeouts, retries and cancellation
//! - [`options`] - per-step timeouts and retry policies
//! - [`state`] - workflow states and allowed transitions

pub mod options;
pub mod orchestrator;
pub mod pool;
pub mod state;

pub use options::{ActivityOptions, RetryPolicy, StepOptions};
pub use orchestrator::{ExportWorkflow, WorkflowContext, WorkflowReport};
pub use pool::WorkerPool;
pub use state::{StateTracker, WorkflowState};
