//! Structured logging setup for Lamina.
//!
//! Context loggers emit plain `tracing` events; nothing is printed until a
//! subscriber is installed. This crate installs one: a `tracing-subscriber`
//! registry with an `EnvFilter` and either JSON (production) or pretty
//! (development) output.
//!
//! # Example
//!
//! ```rust,ignore
//! use lamina_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, filter_directive, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
