//! Export window resolution
//!
//! A run exports the window `[end - batch_window_size, end)`. Manual runs carry
//! `end` in their inputs. Scheduled runs leave it unset and take it from the
//! `ScheduledStartTime` attribute the scheduler attaches to the run.
//!
//! The attribute name is this crate's own convention and not one defined by
//! any scheduler. Whatever triggers scheduled runs must set it under exactly
//! this key, or the run fails to resolve its window.

use crate::domain::interval::{parse_instant, DataInterval};
use crate::domain::spec::ExportSpec;
use crate::domain::{ExportError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Attribute holding the scheduled start instant, as `["<timestamp>"]`
pub const SCHEDULED_START_TIME_ATTRIBUTE: &str = "ScheduledStartTime";

/// Loosely typed attributes attached to a run by its trigger
///
/// Values are kept as raw JSON and validated only when read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchAttributes(HashMap<String, Value>);

impl SearchAttributes {
    /// Empty attribute bag, as seen by manually triggered runs
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes of a run started by a schedule at `scheduled_start_time`
    pub fn scheduled(scheduled_start_time: impl Into<String>) -> Self {
        let mut attributes = Self::new();
        attributes.insert(
            SCHEDULED_START_TIME_ATTRIBUTE,
            Value::Array(vec![Value::String(scheduled_start_time.into())]),
        );
        attributes
    }

    /// Set an attribute
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Raw attribute value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The scheduled start instant as supplied, after type checks
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::TypeConfiguration`] if the attribute is absent, is not
    /// a non-empty array, or its first element is not a string.
    pub fn scheduled_start_time(&self) -> Result<&str> {
        let value = self.get(SCHEDULED_START_TIME_ATTRIBUTE).ok_or_else(|| {
            ExportError::TypeConfiguration(format!(
                "Expected '{SCHEDULED_START_TIME_ATTRIBUTE}' of type 'list[str]', found nothing. \
                 It is set by the scheduler; manually triggered runs must set 'data_interval_end'"
            ))
        })?;

        let first = value.as_array().and_then(|values| values.first()).ok_or_else(|| {
            ExportError::TypeConfiguration(format!(
                "Expected '{SCHEDULED_START_TIME_ATTRIBUTE}' of type 'list[str]', found {value}"
            ))
        })?;

        first.as_str().ok_or_else(|| {
            ExportError::TypeConfiguration(format!(
                "Expected '{SCHEDULED_START_TIME_ATTRIBUTE}' to contain a string, found {first}"
            ))
        })
    }
}

/// Computes the window a run must export
///
/// # Errors
///
/// Returns a configuration fault when no end can be determined, the end is not a
/// valid instant, or the window cannot be represented.
///
/// # Examples
///
/// ```
/// use batch_export::core::window::{resolve_data_interval, SearchAttributes};
/// use batch_export::domain::ExportSpec;
///
/// let spec = ExportSpec::parse_inputs(r#"{
///     "bucket_name": "bucket", "region": "us-east-1",
///     "key_template": "{partition_id}.csv", "batch_window_size": 3600,
///     "team_id": 1, "destination_id": "d"
/// }"#).unwrap();
///
/// let attributes = SearchAttributes::scheduled("2024-01-01T01:00:00Z");
/// let interval = resolve_data_interval(&spec, &attributes).unwrap();
/// assert_eq!(interval.start().to_rfc3339(), "2024-01-01T00:00:00+00:00");
/// ```
pub fn resolve_data_interval(
    spec: &ExportSpec,
    attributes: &SearchAttributes,
) -> Result<DataInterval> {
    let end = match spec.data_interval_end.as_deref().map(str::trim) {
        Some(end) if !end.is_empty() => parse_instant(end)?,
        _ => parse_instant(attributes.scheduled_start_time()?)?,
    };

    DataInterval::ending_at(end, spec.batch_window_size)
}
