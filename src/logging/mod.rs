//! Logging
//!
//! Structured logging through `tracing`, with JSON file output and a small set
//! of macros that keep workflow events uniformly shaped.
//!
//! # Example
//!
//! ```no_run
//! use batch_export::logging::init_logging;
//! use batch_export::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(team_id = 2, "Export scheduled");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a workflow state transition
///
/// # Example
///
/// ```no_run
/// use batch_export::log_run_transition;
///
/// log_run_transition!("wf-1", "ResolvingWindow", "CreatingRun");
/// ```
#[macro_export]
macro_rules! log_run_transition {
    ($workflow_id:expr, $from:expr, $to:expr) => {
        tracing::info!(
            workflow_id = %$workflow_id,
            from = %$from,
            to = %$to,
            "Workflow state transition"
        );
    };
}

/// Log the completion of an export batch
///
/// # Example
///
/// ```no_run
/// use batch_export::log_export_complete;
/// use std::time::Duration;
///
/// log_export_complete!("[2024-01-01T00:00:00+00:00, 2024-01-01T01:00:00+00:00)", Some(42u64), Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($interval:expr, $row_count:expr, $duration:expr) => {
        tracing::info!(
            interval = %$interval,
            row_count = ?$row_count,
            duration_ms = $duration.as_millis() as u64,
            "Export completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use batch_export::log_error_with_context;
/// use batch_export::domain::ExportError;
///
/// let error = ExportError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            error_kind = %$error.kind(),
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use batch_export::log_retry_attempt;
///
/// log_retry_attempt!("export_activity", 2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($step:expr, $attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            step = %$step,
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying step"
        );
    };
}
