//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod backfill;
pub mod export;
pub mod init;
pub mod status;
pub mod validate;

use crate::domain::{ExportError, ExportSpec, Result};
use clap::Args;
use std::path::PathBuf;

/// Workflow inputs given inline or by file
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Workflow inputs as a JSON object
    #[arg(long, conflicts_with = "inputs_file", required_unless_present = "inputs_file")]
    pub inputs: Option<String>,

    /// Path to a JSON file holding the workflow inputs
    #[arg(long, value_name = "PATH")]
    pub inputs_file: Option<PathBuf>,
}

impl InputArgs {
    /// Parse the workflow inputs
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Configuration`] if the file cannot be read and
    /// [`ExportError::InvalidInputs`] if the JSON is not valid inputs.
    pub fn load(&self) -> Result<ExportSpec> {
        match (&self.inputs, &self.inputs_file) {
            (Some(json), _) => ExportSpec::parse_inputs(json),
            (None, Some(path)) => {
                let json = std::fs::read_to_string(path).map_err(|e| {
                    ExportError::Configuration(format!(
                        "Failed to read inputs file {}: {e}",
                        path.display()
                    ))
                })?;
                ExportSpec::parse_inputs(&json)
            }
            (None, None) => Err(ExportError::InvalidInputs(
                "Either --inputs or --inputs-file is required".to_string(),
            )),
        }
    }
}
