//! Half-open export time windows

use crate::domain::{ExportError, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp layout the analytical store expects for `toDateTime(...)` parameters
pub const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A half-open time range `[start, end)`
///
/// `start` is inclusive, `end` is exclusive. Both are UTC.
///
/// # Examples
///
/// ```
/// use batch_export::domain::interval::{parse_instant, DataInterval};
///
/// let end = parse_instant("2024-01-01T01:00:00+00:00").unwrap();
/// let interval = DataInterval::ending_at(end, 3600).unwrap();
/// assert_eq!(interval.start().to_rfc3339(), "2024-01-01T00:00:00+00:00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DataInterval {
    /// Builds the window of `window_size_seconds` that ends at `end`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the window is empty or the start
    /// would fall outside the representable range.
    pub fn ending_at(end: DateTime<Utc>, window_size_seconds: u64) -> Result<Self> {
        if window_size_seconds == 0 {
            return Err(ExportError::Configuration(
                "batch_window_size must be greater than 0".to_string(),
            ));
        }

        let window = i64::try_from(window_size_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                ExportError::Configuration(format!(
                    "batch_window_size {window_size_seconds} is out of range"
                ))
            })?;

        let start = end.checked_sub_signed(window).ok_or_else(|| {
            ExportError::Configuration(format!(
                "Interval start underflows for end {end} and window {window_size_seconds}s"
            ))
        })?;

        Ok(Self { start, end })
    }

    /// Inclusive start of the window
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end of the window
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Length of the window
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether `instant` falls inside `[start, end)`
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Start formatted for store query parameters
    pub fn start_param(&self) -> String {
        self.start.format(STORE_TIMESTAMP_FORMAT).to_string()
    }

    /// End formatted for store query parameters
    pub fn end_param(&self) -> String {
        self.end.format(STORE_TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for DataInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Parses an ISO-8601 instant and normalizes it to UTC
///
/// Accepts RFC 3339 timestamps with an offset, and naive timestamps
/// (`2024-01-01T01:00:00` or `2024-01-01 01:00:00`), which are taken as UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, layout) {
            return Ok(naive.and_utc());
        }
    }

    Err(ExportError::Configuration(format!(
        "Invalid timestamp '{value}': expected an ISO-8601 instant"
    )))
}
