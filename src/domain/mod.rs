//! Domain models and types.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Workflow inputs** ([`ExportSpec`])
//! - **Time windows** ([`DataInterval`])
//! - **Run records** ([`ExportRun`], [`RunStatus`])
//! - **Strongly-typed identifiers** ([`TeamId`], [`DestinationId`], [`RunId`])
//! - **Error types** ([`ExportError`], [`ErrorKind`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`]. Every error carries an
//! [`ErrorKind`] that retry policies use to decide whether a step may be re-attempted:
//!
//! ```rust
//! use batch_export::domain::{ErrorKind, ExportError};
//!
//! let err = ExportError::Connection("Cannot establish connection to ClickHouse".to_string());
//! assert_eq!(err.kind(), ErrorKind::Connectivity);
//! assert!(!err.is_retryable());
//! ```

pub mod errors;
pub mod ids;
pub mod interval;
pub mod result;
pub mod run;
pub mod spec;

pub use errors::{ErrorKind, ExportError};
pub use ids::{DestinationId, RunId, TeamId};
pub use interval::{parse_instant, DataInterval};
pub use result::Result;
pub use run::{CreateRunRequest, ExportRun, RunStatus};
pub use spec::{Credentials, ExportSpec};
