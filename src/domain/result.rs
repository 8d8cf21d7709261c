//! Result type alias for the export pipeline

use super::errors::ExportError;

/// Result type alias using [`ExportError`]
///
/// # Examples
///
/// ```
/// use batch_export::domain::result::Result;
/// use batch_export::domain::errors::ExportError;
///
/// fn failing_function() -> Result<()> {
///     Err(ExportError::Configuration("Invalid input".to_string()))
/// }
///
/// assert!(failing_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, ExportError>;
