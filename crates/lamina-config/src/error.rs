//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be produced.
///
/// Returned before any wrapped handler exists; never delivered through an
/// invocation outcome.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The requested file does not exist.
    #[error("no configuration at {path}")]
    FileNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read {path}")]
    Unreadable {
        /// Path of the file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The input is neither TOML nor JSON.
    #[error("unsupported configuration format `{0}` (expected toml or json)")]
    UnsupportedFormat(String),

    /// Malformed TOML.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A setting parsed but its value is not acceptable.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted setting name, e.g. `logging.level`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable could not be applied.
    #[error("environment override {var}: {reason}")]
    InvalidEnv {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `.env` file exists but could not be loaded.
    #[error("cannot load .env: {0}")]
    Dotenv(String),
}

impl ConfigError {
    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEnv {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors caused by a setting's value rather than by
    /// reading or parsing input.
    pub const fn is_invalid_setting(&self) -> bool {
        matches!(self, Self::InvalidValue { .. } | Self::InvalidEnv { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_setting() {
        let err = ConfigError::invalid_value("logging.level", "unknown log level: loud");
        assert_eq!(err.to_string(), "logging.level: unknown log level: loud");

        let err = ConfigError::invalid_env("LAMINA__ERRORS__ERROR_STACK", "expected boolean");
        assert!(err.to_string().contains("LAMINA__ERRORS__ERROR_STACK"));
    }

    #[test]
    fn test_is_invalid_setting() {
        assert!(ConfigError::invalid_env("X", "y").is_invalid_setting());
        assert!(!ConfigError::UnsupportedFormat("yaml".into()).is_invalid_setting());
        assert!(!ConfigError::FileNotFound { path: "lamina.toml".into() }.is_invalid_setting());
    }
}
