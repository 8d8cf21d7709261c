//! Step timeouts and retry policies

use crate::config::schema::{RetryConfig, WorkflowConfig};
use crate::domain::{ErrorKind, ExportError};
use std::time::Duration;

/// Exponential backoff retry policy
///
/// An error is retried only if its kind is retryable, it is not listed in
/// `non_retryable`, and attempts remain.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub initial_interval: Duration,

    /// Multiplier applied to the delay after each retry
    pub backoff_coefficient: f64,

    /// Upper bound on the delay
    pub maximum_interval: Duration,

    /// Attempts including the first
    pub maximum_attempts: u32,

    /// Kinds that fail the step immediately
    pub non_retryable: Vec<ErrorKind>,
}

impl RetryPolicy {
    /// Policy from the `[workflow.retry]` section
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            initial_interval: Duration::from_millis(config.initial_interval_ms),
            backoff_coefficient: config.backoff_coefficient,
            maximum_interval: Duration::from_millis(config.maximum_interval_ms),
            maximum_attempts: config.maximum_attempts,
            non_retryable: Vec::new(),
        }
    }

    /// Adds kinds that must never be retried
    pub fn with_non_retryable(mut self, kinds: &[ErrorKind]) -> Self {
        for kind in kinds {
            if !self.non_retryable.contains(kind) {
                self.non_retryable.push(*kind);
            }
        }
        self
    }

    /// Whether `error`, raised by attempt number `attempt` (1-based), may be retried
    pub fn should_retry(&self, error: &ExportError, attempt: u32) -> bool {
        attempt < self.maximum_attempts
            && error.is_retryable()
            && !self.non_retryable.contains(&error.kind())
    }

    /// Delay after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let factor = self.backoff_coefficient.powi(exponent);
        let millis = self.initial_interval.as_millis() as f64 * factor;
        let capped = millis.min(self.maximum_interval.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Timeouts and retry policy of one workflow step
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityOptions {
    /// Bound on a single attempt once it has started
    pub start_to_close_timeout: Duration,

    /// Bound on waiting for a worker slot before an attempt starts
    pub schedule_to_close_timeout: Duration,

    /// Retry policy across attempts
    pub retry_policy: RetryPolicy,
}

impl ActivityOptions {
    /// Options from the `[workflow]` section
    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self {
            start_to_close_timeout: Duration::from_secs(config.start_to_close_timeout_secs),
            schedule_to_close_timeout: Duration::from_secs(config.schedule_to_close_timeout_secs),
            retry_policy: RetryPolicy::from_config(&config.retry),
        }
    }

    /// Same options with a different retry policy
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }
}

impl Default for ActivityOptions {
    fn default() -> Self {
        Self::from_config(&WorkflowConfig::default())
    }
}

/// Per-step options of the export workflow
#[derive(Debug, Clone, PartialEq)]
pub struct StepOptions {
    /// Window resolution and query validation
    pub resolve_window: ActivityOptions,

    /// Run creation; constraint violations are permanent
    pub create_run: ActivityOptions,

    /// Export; misconfiguration and an unreachable store are permanent
    pub export: ActivityOptions,

    /// Finalization
    pub finalize: ActivityOptions,
}

impl StepOptions {
    /// Options for every step from the `[workflow]` section
    pub fn from_config(config: &WorkflowConfig) -> Self {
        let base = ActivityOptions::from_config(config);

        let resolve_window = base.clone().with_retry_policy(
            base.retry_policy
                .clone()
                .with_non_retryable(&[ErrorKind::Configuration]),
        );
        let create_run = base.clone().with_retry_policy(
            base.retry_policy
                .clone()
                .with_non_retryable(&[ErrorKind::Integrity]),
        );
        let export = base.clone().with_retry_policy(
            base.retry_policy
                .clone()
                .with_non_retryable(&[ErrorKind::Configuration, ErrorKind::Connectivity]),
        );

        Self {
            resolve_window,
            create_run,
            export,
            finalize: base,
        }
    }
}

impl Default for StepOptions {
    fn default() -> Self {
        Self::from_config(&WorkflowConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, 1_000)]
    #[test_case(2, 2_000)]
    #[test_case(3, 4_000)]
    #[test_case(7, 64_000)]
    #[test_case(8, 100_000 ; "capped at maximum interval")]
    #[test_case(40, 100_000 ; "large attempt numbers stay capped")]
    fn test_backoff_delays(attempt: u32, expected_ms: u64) {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(attempt), Duration::from_millis(expected_ms));
    }

    #[test]
    fn test_attempt_limit() {
        let policy = RetryPolicy::default();
        let err = ExportError::Timeout("slow".to_string());

        assert!(policy.should_retry(&err, 1));
        assert!(policy.should_retry(&err, 2));
        assert!(!policy.should_retry(&err, 3));
    }

    #[test]
    fn test_non_retryable_kinds() {
        let policy = RetryPolicy::default().with_non_retryable(&[ErrorKind::Transient]);
        assert!(!policy.should_retry(&ExportError::Timeout("slow".to_string()), 1));
    }

    #[test]
    fn test_permanent_errors_never_retried() {
        let policy = RetryPolicy::default();
        for err in [
            ExportError::Configuration("bad".to_string()),
            ExportError::Connection("down".to_string()),
            ExportError::Integrity("duplicate".to_string()),
            ExportError::Cancelled("stop".to_string()),
            ExportError::Internal("panic".to_string()),
        ] {
            assert!(!policy.should_retry(&err, 1), "{err} should not be retried");
        }
    }

    #[test]
    fn test_step_options_defaults() {
        let options = StepOptions::default();

        assert_eq!(options.export.start_to_close_timeout, Duration::from_secs(20 * 60));
        assert_eq!(options.export.schedule_to_close_timeout, Duration::from_secs(5 * 60));
        assert_eq!(options.export.retry_policy.maximum_attempts, 3);
        assert!(options
            .export
            .retry_policy
            .non_retryable
            .contains(&ErrorKind::Connectivity));
        assert_eq!(
            options.create_run.retry_policy.non_retryable,
            vec![ErrorKind::Integrity]
        );
        assert!(options.finalize.retry_policy.non_retryable.is_empty());
    }
}
