//! Structured, per-invocation logger.
//!
//! A [`ContextLogger`] carries a fixed set of JSON fields (function name,
//! request ID, version, and anything added through [`ContextLogger::child`])
//! and emits every record as a `tracing` event. Records below the logger's
//! own [`LogLevel`] are dropped before they reach the subscriber, so the
//! level resolved at composition time applies even when the global
//! subscriber is more verbose.

use crate::error::HandlerError;
use crate::serialize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The `tracing` target used for records emitted by context loggers.
pub const LOG_TARGET: &str = "lamina::context";

/// Log severity for a [`ContextLogger`].
///
/// Accepts the conventional names (`trace`, `debug`, `info`, `warn`,
/// `error`, `fatal`) case-insensitively, plus the numeric levels used by
/// JSON loggers on function platforms (10, 20, 30, 40, 50, 60).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Very fine-grained diagnostics.
    Trace,
    /// Debugging information.
    Debug,
    /// Normal operational messages.
    #[default]
    Info,
    /// Something unexpected, but the invocation continues.
    Warn,
    /// The invocation failed.
    Error,
    /// The process is about to become unusable.
    Fatal,
}

/// Error returned when a log level string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl LogLevel {
    /// Environment variable consulted by [`LogLevel::from_env`].
    pub const ENV_VAR: &'static str = "LOG_LEVEL";

    /// Reads the level from the `LOG_LEVEL` environment variable.
    ///
    /// Returns `Ok(None)` if the variable is unset or empty.
    pub fn from_env() -> Result<Option<Self>, ParseLevelError> {
        match std::env::var(Self::ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => value.parse().map(Some),
            _ => Ok(None),
        }
    }

    /// Returns the lowercase level name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// Returns the numeric level (10 for trace through 60 for fatal).
    #[must_use]
    pub const fn as_number(self) -> u8 {
        match self {
            Self::Trace => 10,
            Self::Debug => 20,
            Self::Info => 30,
            Self::Warn => 40,
            Self::Error => 50,
            Self::Fatal => 60,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" | "10" => Ok(Self::Trace),
            "debug" | "20" => Ok(Self::Debug),
            "info" | "30" => Ok(Self::Info),
            "warn" | "warning" | "40" => Ok(Self::Warn),
            "error" | "50" => Ok(Self::Error),
            "fatal" | "60" => Ok(Self::Fatal),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// A structured logger bound to one invocation.
///
/// Cloning is cheap relative to an invocation and never shares mutable
/// state; [`ContextLogger::child`] returns a new logger and leaves the
/// receiver untouched.
///
/// # Example
///
/// ```
/// use lamina_core::{ContextLogger, LogLevel};
/// use serde_json::json;
///
/// let log = ContextLogger::new("my-function", LogLevel::Info);
/// let child = log.child([("userId", json!("u-123"))]);
///
/// assert!(log.fields().get("userId").is_none());
/// assert_eq!(child.fields()["userId"], "u-123");
/// child.info("loaded user");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ContextLogger {
    name: String,
    level: LogLevel,
    fields: Map<String, Value>,
}

impl ContextLogger {
    /// Creates a logger with the given name and minimum level.
    #[must_use]
    pub fn new(name: impl Into<String>, level: LogLevel) -> Self {
        let name = name.into();
        let mut fields = Map::new();
        fields.insert("name".to_string(), Value::String(name.clone()));
        Self {
            name,
            level,
            fields,
        }
    }

    /// Returns the logger name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the minimum level this logger emits.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Returns the fields attached to every record.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns the logger with an additional bound field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Derives a logger carrying `extra` in addition to the current fields.
    #[must_use]
    pub fn child<I, K>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut child = self.clone();
        child
            .fields
            .extend(extra.into_iter().map(|(k, v)| (k.into(), v)));
        child
    }

    /// Returns `true` if records at `level` would be emitted.
    #[must_use]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    /// Emits a record at `level`.
    pub fn log(&self, level: LogLevel, message: &str) {
        self.emit(level, None, message);
    }

    /// Emits a record at `level` with extra one-off fields.
    pub fn log_with<I, K>(&self, level: LogLevel, extra: I, message: &str)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let extra: Map<String, Value> = extra.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.emit(level, Some(extra), message);
    }

    /// Emits a trace record.
    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }

    /// Emits a debug record.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Emits an info record.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Emits a warn record.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    /// Emits an error record.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    /// Emits a fatal record.
    pub fn fatal(&self, message: &str) {
        self.log(LogLevel::Fatal, message);
    }

    /// Emits an error record with `err` attached under the `err` key.
    ///
    /// The error is normalized through [`serialize::error_value`].
    pub fn error_with(&self, err: &HandlerError, message: &str) {
        self.log_with(
            LogLevel::Error,
            [("err", serialize::error_value(err))],
            message,
        );
    }

    fn emit(&self, level: LogLevel, extra: Option<Map<String, Value>>, message: &str) {
        if !self.enabled(level) {
            return;
        }

        let mut record = self.fields.clone();
        if let Some(extra) = extra {
            record.extend(extra);
        }
        let fields = Value::Object(record).to_string();
        let name = self.name.as_str();

        match level {
            LogLevel::Trace => {
                tracing::trace!(target: LOG_TARGET, logger = name, fields = %fields, "{message}");
            }
            LogLevel::Debug => {
                tracing::debug!(target: LOG_TARGET, logger = name, fields = %fields, "{message}");
            }
            LogLevel::Info => {
                tracing::info!(target: LOG_TARGET, logger = name, fields = %fields, "{message}");
            }
            LogLevel::Warn => {
                tracing::warn!(target: LOG_TARGET, logger = name, fields = %fields, "{message}");
            }
            LogLevel::Error | LogLevel::Fatal => {
                tracing::error!(
                    target: LOG_TARGET,
                    logger = name,
                    fatal = matches!(level, LogLevel::Fatal),
                    fields = %fields,
                    "{message}"
                );
            }
        }
    }
}
