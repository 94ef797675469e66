//! Configuration types.
//!
//! This module provides the top-level [`LaminaConfig`] struct and its
//! sections. Every section has a default, so a file only needs to name the
//! keys it changes. Unknown keys are ignored.

use crate::ConfigError;
use lamina_core::LogLevel;
use lamina_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

/// Complete Lamina configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use lamina_config::LaminaConfig;
///
/// let config = LaminaConfig::default();
/// assert_eq!(config.logging.level, "info");
/// assert!(config.errors.error_stack);
/// assert!(config.dispatch.strict_next);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LaminaConfig {
    /// Context logger and subscriber settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Error delivery settings.
    #[serde(default)]
    pub errors: ErrorsSection,

    /// Middleware dispatch settings.
    #[serde(default)]
    pub dispatch: DispatchSection,
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSection {
    /// Minimum level for context loggers (name or numeric level).
    pub level: String,

    /// Subscriber output format.
    pub format: LogFormat,

    /// Extra subscriber filter directives.
    pub directives: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: LogLevel::Info.as_str().to_string(),
            format: LogFormat::Json,
            directives: None,
        }
    }
}

/// `[errors]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ErrorsSection {
    /// Keep error stacks in delivered errors. When `false` the stack is
    /// emptied before delivery.
    pub error_stack: bool,
}

impl Default for ErrorsSection {
    fn default() -> Self {
        Self { error_stack: true }
    }
}

/// `[dispatch]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatchSection {
    /// Reject a second call of the same `next` continuation.
    pub strict_next: bool,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self { strict_next: true }
    }
}

impl LaminaConfig {
    /// Development preset: debug level, pretty output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LoggingSection {
                level: LogLevel::Debug.as_str().to_string(),
                format: LogFormat::Pretty,
                directives: None,
            },
            ..Self::default()
        }
    }

    /// Production preset: info level, JSON output, stacks stripped.
    #[must_use]
    pub fn production() -> Self {
        Self {
            errors: ErrorsSection { error_stack: false },
            ..Self::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `logging.level` is not a
    /// known level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level().map(|_| ())
    }

    /// Returns the parsed context log level.
    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        self.logging
            .level
            .parse()
            .map_err(|e: lamina_core::ParseLevelError| {
                ConfigError::invalid_value("logging.level", e.to_string())
            })
    }

    /// Builds the subscriber configuration for `lamina-telemetry`.
    pub fn to_log_config(&self) -> Result<LogConfig, ConfigError> {
        Ok(LogConfig {
            level: self.log_level()?,
            format: self.logging.format,
            directives: self.logging.directives.clone(),
            ..LogConfig::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LaminaConfig::default();
        assert_eq!(config.log_level().unwrap(), LogLevel::Info);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.errors.error_stack);
        assert!(config.dispatch.strict_next);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let dev = LaminaConfig::development();
        assert_eq!(dev.log_level().unwrap(), LogLevel::Debug);
        assert_eq!(dev.logging.format, LogFormat::Pretty);

        let prod = LaminaConfig::production();
        assert!(!prod.errors.error_stack);
    }

    #[test]
    fn test_invalid_level_fails_validation() {
        let mut config = LaminaConfig::default();
        config.logging.level = "loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_numeric_level_is_valid() {
        let mut config = LaminaConfig::default();
        config.logging.level = "50".to_string();
        assert_eq!(config.log_level().unwrap(), LogLevel::Error);
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: LaminaConfig = toml::from_str("[errors]\nerror_stack = false\n").unwrap();
        assert!(!config.errors.error_stack);
        assert!(config.dispatch.strict_next);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config: LaminaConfig = serde_json::from_str(
            r#"{"logging": {"level": "warn", "colour": "blue"}, "extra": 1}"#,
        )
        .unwrap();
        assert_eq!(config.log_level().unwrap(), LogLevel::Warn);
    }

    #[test]
    fn test_to_log_config() {
        let mut config = LaminaConfig::development();
        config.logging.directives = Some("lamina_middleware=trace".to_string());
        let log = config.to_log_config().unwrap();
        assert_eq!(log.level, LogLevel::Debug);
        assert_eq!(log.format, LogFormat::Pretty);
        assert_eq!(log.filter(), "debug,lamina_middleware=trace");
    }
}
