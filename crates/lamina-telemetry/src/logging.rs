//! Process-wide structured logging.
//!
//! Installs the global `tracing` subscriber that context loggers write to.
//!
//! # Features
//!
//! - JSON-formatted output by default
//! - Human-readable output for local development
//! - Level filtering using the same level names as context loggers
//!
//! # Example
//!
//! ```rust,ignore
//! use lamina_core::LogLevel;
//! use lamina_telemetry::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::default().with_level(LogLevel::Debug);
//! init_logging(&config)?;
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use lamina_core::LogLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Output format for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line, human-readable output.
    Pretty,
}

impl LogFormat {
    /// Returns the lowercase format name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(TelemetryError::UnknownFormat(other.to_string())),
        }
    }
}

/// Settings for the process-wide subscriber.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// When `false`, [`init_logging`] installs nothing.
    pub enabled: bool,

    /// Minimum level for all records.
    pub level: LogLevel,

    /// Output format.
    pub format: LogFormat,

    /// Extra `EnvFilter` directives appended after the level
    /// (e.g. `"lamina_middleware=debug"`).
    pub directives: Option<String>,

    /// Source file and line of each record.
    pub file_line_info: bool,

    /// Emitting thread ID of each record.
    pub thread_ids: bool,

    /// `tracing` target of each record; context loggers use `lamina::context`.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: LogLevel::Info,
            format: LogFormat::Json,
            directives: None,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Debug level, pretty output with source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            file_line_info: true,
            ..Self::default()
        }
    }

    /// Info level, JSON lines.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Returns the configuration with a different level.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Returns the configuration with a different format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Returns the full filter string for this configuration.
    pub fn filter(&self) -> String {
        let base = filter_directive(self.level);
        match self.directives.as_deref() {
            Some(extra) if !extra.trim().is_empty() => format!("{base},{extra}"),
            _ => base.to_string(),
        }
    }
}

/// Maps a context log level to a `tracing` filter directive.
///
/// `tracing` has no level above `error`, so `fatal` filters as `error`.
pub const fn filter_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error | LogLevel::Fatal => "error",
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if the extra directives do not
/// parse, and `TelemetryError::LoggingInit` if a global subscriber is
/// already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.filter())?;

    let base = tracing_subscriber::fmt::layer()
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_thread_ids(config.thread_ids)
        .with_target(config.include_target);

    let output: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
    };

    tracing_subscriber::registry()
        .with(output.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(level = %config.level, format = %config.format, "logging initialized");
    Ok(())
}

/// Parses `EnvFilter` directives.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if `filter` does not parse.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter(e.to_string()))
}
