//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Invalid filter directive.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Unknown output format name.
    #[error("Unknown log format: {0} (expected json or pretty)")]
    UnknownFormat(String),
}
