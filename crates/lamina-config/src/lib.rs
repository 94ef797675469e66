//! Typed configuration for Lamina.
//!
//! This crate provides a layered configuration system with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides (`LAMINA__SECTION__KEY`)
//! - The plain `LOG_LEVEL` variable used by function platforms
//! - Validation of log levels before any handler is built
//!
//! Unknown keys are ignored, so a file shared with other tools can carry
//! extra sections.
//!
//! # Example
//!
//! ```no_run
//! use lamina_config::{ConfigLoader, LaminaConfig};
//!
//! # fn main() -> Result<(), lamina_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("lamina.toml")?
//!     .with_legacy_env()
//!     .with_env_prefix("LAMINA")
//!     .load()?;
//!
//! println!("context loggers at {}", config.log_level()?);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [errors]
//! error_stack = true
//!
//! [dispatch]
//! strict_next = true
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;

pub use config::{DispatchSection, ErrorsSection, LaminaConfig, LoggingSection};
pub use error::ConfigError;
pub use lamina_telemetry::LogFormat;
pub use loader::ConfigLoader;
