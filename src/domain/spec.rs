//! Workflow inputs
//!
//! [`ExportSpec`] is the immutable input of one export run. It arrives as a JSON
//! object from the CLI or from a schedule definition.

use crate::config::SecretString;
use crate::domain::ids::{DestinationId, TeamId};
use crate::domain::{ExportError, Result};
use secrecy::ExposeSecret;
use serde::Deserialize;

/// Inputs for one export run
///
/// # Examples
///
/// ```
/// use batch_export::domain::spec::ExportSpec;
///
/// let spec = ExportSpec::parse_inputs(r#"{
///     "bucket_name": "my-bucket",
///     "region": "us-east-1",
///     "key_template": "exports/{table_name}/{partition_id}.csv",
///     "batch_window_size": 3600,
///     "team_id": 2,
///     "destination_id": "s3-main"
/// }"#).unwrap();
///
/// assert_eq!(spec.table_name, "events");
/// assert_eq!(spec.file_format, "CSVWithNames");
/// assert!(spec.data_interval_end.is_none());
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportSpec {
    /// Destination bucket
    pub bucket_name: String,

    /// Region of the destination bucket
    pub region: String,

    /// Object key template; may contain `{partition_id}`, `{table_name}` and `{file_format}`
    pub key_template: String,

    /// Size in seconds of the exported window, e.g. 3600 for hourly batches
    pub batch_window_size: u64,

    /// Team whose data is exported
    pub team_id: TeamId,

    /// Destination this run belongs to
    pub destination_id: DestinationId,

    /// Source table
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Output format understood by the analytical store
    #[serde(default = "default_file_format")]
    pub file_format: String,

    /// Optional partition granularity (hour, day, week, month)
    #[serde(default)]
    pub partition_key: Option<String>,

    /// Access key id for the destination
    #[serde(default)]
    pub aws_access_key_id: Option<String>,

    /// Secret access key for the destination
    #[serde(default)]
    pub aws_secret_access_key: Option<SecretString>,

    /// End of the window for manual runs; `None` for scheduled runs
    #[serde(default)]
    pub data_interval_end: Option<String>,
}

/// Destination credentials, present only when both halves are configured
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Access key id
    pub access_key_id: String,

    /// Secret access key
    pub secret_access_key: SecretString,
}

impl ExportSpec {
    /// Parses workflow inputs from a JSON document
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidInputs`] for malformed JSON, unknown or missing
    /// fields, or values that fail validation.
    pub fn parse_inputs(json: &str) -> Result<Self> {
        let spec: ExportSpec = serde_json::from_str(json)
            .map_err(|e| ExportError::InvalidInputs(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Validates field values that serde cannot check
    pub fn validate(&self) -> Result<()> {
        if self.bucket_name.trim().is_empty() {
            return Err(ExportError::InvalidInputs(
                "bucket_name cannot be empty".to_string(),
            ));
        }

        if self.key_template.trim().is_empty() {
            return Err(ExportError::InvalidInputs(
                "key_template cannot be empty".to_string(),
            ));
        }

        if self.batch_window_size == 0 {
            return Err(ExportError::InvalidInputs(
                "batch_window_size must be greater than 0".to_string(),
            ));
        }

        if self.file_format.trim().is_empty() {
            return Err(ExportError::InvalidInputs(
                "file_format cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Credentials to pass to the destination, if both halves are set
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.aws_access_key_id, &self.aws_secret_access_key) {
            (Some(key_id), Some(secret)) if !secret.expose_secret().is_empty() => {
                Some(Credentials {
                    access_key_id: key_id.clone(),
                    secret_access_key: secret.clone(),
                })
            }
            _ => None,
        }
    }

    /// Copy of this spec pinned to an explicit window end
    pub fn with_data_interval_end(&self, end: impl Into<String>) -> Self {
        let mut spec = self.clone();
        spec.data_interval_end = Some(end.into());
        spec
    }
}

fn default_table_name() -> String {
    "events".to_string()
}

fn default_file_format() -> String {
    "CSVWithNames".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "bucket_name": "bucket",
        "region": "eu-west-1",
        "key_template": "{table_name}/{partition_id}.{file_format}",
        "batch_window_size": 3600,
        "team_id": 7,
        "destination_id": "dest"
    }"#;

    #[test]
    fn test_parse_minimal_inputs_applies_defaults() {
        let spec = ExportSpec::parse_inputs(MINIMAL).unwrap();
        assert_eq!(spec.team_id, TeamId::new(7));
        assert_eq!(spec.table_name, "events");
        assert_eq!(spec.file_format, "CSVWithNames");
        assert!(spec.partition_key.is_none());
        assert!(spec.credentials().is_none());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let json = MINIMAL.replace("\"team_id\": 7", "\"team_id\": 7, \"extra\": true");
        let err = ExportSpec::parse_inputs(&json).unwrap_err();
        assert!(matches!(err, ExportError::InvalidInputs(_)));
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let json = MINIMAL.replace("\"region\": \"eu-west-1\",", "");
        let err = ExportSpec::parse_inputs(&json).unwrap_err();
        assert!(err.to_string().contains("region"));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(matches!(
            ExportSpec::parse_inputs("{not json"),
            Err(ExportError::InvalidInputs(_))
        ));
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let json = MINIMAL.replace("3600", "0");
        assert!(ExportSpec::parse_inputs(&json).is_err());
    }

    #[test]
    fn test_credentials_require_both_halves() {
        let json = MINIMAL.replace(
            "\"team_id\": 7",
            "\"team_id\": 7, \"aws_access_key_id\": \"AKIA123\"",
        );
        let spec = ExportSpec::parse_inputs(&json).unwrap();
        assert!(spec.credentials().is_none());

        let json = MINIMAL.replace(
            "\"team_id\": 7",
            "\"team_id\": 7, \"aws_access_key_id\": \"AKIA123\", \"aws_secret_access_key\": \"s3cr3t\"",
        );
        let spec = ExportSpec::parse_inputs(&json).unwrap();
        let credentials = spec.credentials().unwrap();
        assert_eq!(credentials.access_key_id, "AKIA123");
        assert_eq!(credentials.secret_access_key.expose_secret(), "s3cr3t");
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let json = MINIMAL.replace(
            "\"team_id\": 7",
            "\"team_id\": 7, \"aws_access_key_id\": \"AKIA123\", \"aws_secret_access_key\": \"s3cr3t\"",
        );
        let spec = ExportSpec::parse_inputs(&json).unwrap();
        assert!(!format!("{spec:?}").contains("s3cr3t"));
    }

    #[test]
    fn test_with_data_interval_end() {
        let spec = ExportSpec::parse_inputs(MINIMAL).unwrap();
        let pinned = spec.with_data_interval_end("2024-01-01T01:00:00+00:00");
        assert_eq!(
            pinned.data_interval_end.as_deref(),
            Some("2024-01-01T01:00:00+00:00")
        );
        assert!(spec.data_interval_end.is_none());
    }
}
