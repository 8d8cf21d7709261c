//! Domain error types
//!
//! Every failure in the export pipeline is an [`ExportError`]. Each variant maps to an
//! [`ErrorKind`], and the kind decides whether a retry policy may re-attempt the step.
//! Third-party error types never leak through this enum.

use std::fmt;
use thiserror::Error;

/// Failure category used by retry policies
///
/// Classification is by variant, never by matching on error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Permanent misconfiguration (bad inputs, unsupported table or partition key)
    Configuration,
    /// The analytical store could not be reached
    Connectivity,
    /// A ledger constraint was violated (duplicate run, missing column value)
    Integrity,
    /// Timeouts, I/O hiccups and other failures that may succeed on a later attempt
    Transient,
    /// The run was cancelled externally
    Cancelled,
    /// Unexpected internal failure, such as a panic inside a step
    Internal,
}

impl ErrorKind {
    /// Whether errors of this kind may be retried at all
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Connectivity => "connectivity",
            ErrorKind::Integrity => "integrity",
            ErrorKind::Transient => "transient",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Main error type for the export pipeline
#[derive(Debug, Error)]
pub enum ExportError {
    /// Invalid application configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Workflow inputs could not be parsed
    #[error("Invalid workflow inputs: {0}")]
    InvalidInputs(String),

    /// The scheduler-provided timing attribute is missing or has the wrong shape
    #[error("Type configuration error: {0}")]
    TypeConfiguration(String),

    /// The requested source table is not exportable
    #[error("Unsupported table: {0}")]
    UnsupportedTable(String),

    /// The requested partition key is not registered for the table
    #[error("Unsupported partition key '{partition_key}' for table '{table_name}'")]
    UnsupportedPartitionKey {
        table_name: String,
        partition_key: String,
    },

    /// The analytical store is unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement against the analytical store failed
    #[error("Query failed: {0}")]
    Query(String),

    /// A ledger constraint was violated
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// The ledger could not be reached or a ledger statement failed transiently
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// A step exceeded one of its timeouts
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The run was cancelled
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExportError {
    /// Failure category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::Configuration(_)
            | ExportError::InvalidInputs(_)
            | ExportError::TypeConfiguration(_)
            | ExportError::UnsupportedTable(_)
            | ExportError::UnsupportedPartitionKey { .. } => ErrorKind::Configuration,
            ExportError::Connection(_) => ErrorKind::Connectivity,
            ExportError::Integrity(_) => ErrorKind::Integrity,
            ExportError::Query(_)
            | ExportError::LedgerUnavailable(_)
            | ExportError::Timeout(_)
            | ExportError::Serialization(_)
            | ExportError::Io(_) => ErrorKind::Transient,
            ExportError::Cancelled(_) => ErrorKind::Cancelled,
            ExportError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether this error may be retried by a step retry policy
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ExportError {
    fn from(err: toml::de::Error) -> Self {
        ExportError::Configuration(format!("TOML parse error: {err}"))
    }
}
