//! Integration tests for logging functionality
//!
//! The global subscriber can only be installed once per process, so a single
//! test covers initialization end to end.

use batch_export::config::LoggingConfig;
use batch_export::domain::ExportError;
use batch_export::logging::init_logging;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_init_logging_creates_directory_and_installs_once() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "hourly".to_string(),
    };
    assert!(!log_path.exists());

    let guard = init_logging("debug", &config).unwrap();
    assert!(log_path.is_dir());

    batch_export::log_run_transition!("wf-logging", "ResolvingWindow", "CreatingRun");

    let second = init_logging("info", &LoggingConfig::default());
    assert!(matches!(second, Err(ExportError::Internal(_))));

    drop(guard);
}

#[test]
fn test_invalid_level_is_rejected() {
    let result = init_logging("verbose", &LoggingConfig::default());
    assert!(matches!(result, Err(ExportError::Configuration(_))));
}
