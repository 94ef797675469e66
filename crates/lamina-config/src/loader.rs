//! Layered loading of [`LaminaConfig`].
//!
//! A preset or file provides the base; environment variables patch it.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use lamina_core::LogLevel;

use crate::{ConfigError, LaminaConfig};

/// Builds a [`LaminaConfig`] from presets, files and the environment.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Configuration file (TOML or JSON)
/// 3. Plain `LOG_LEVEL`, if [`with_legacy_env`](Self::with_legacy_env) is set
/// 4. Prefixed environment variables
///
/// # Example
///
/// ```no_run
/// use lamina_config::ConfigLoader;
///
/// # fn main() -> Result<(), lamina_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("lamina.toml")?
///     .with_env_prefix("LAMINA")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: LaminaConfig,
    env_prefix: Option<String>,
    legacy_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader seeded with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: LaminaConfig::default(),
            env_prefix: None,
            legacy_env: false,
        }
    }

    /// Resets to the defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = LaminaConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = LaminaConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = LaminaConfig::production();
        self
    }

    /// Replaces the configuration with the contents of `path`.
    ///
    /// The format (TOML or JSON) is chosen by file extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist, cannot be read, or
    /// does not parse.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`"toml"` or
    /// `"json"`).
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[dispatch]\nstrict_next = false\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(!config.dispatch.strict_next);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => return Err(ConfigError::UnsupportedFormat(format.to_string())),
        };
        Ok(self)
    }

    /// Enables `PREFIX__SECTION__KEY` overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`, e.g.
    /// `LAMINA__LOGGING__LEVEL=debug` or `LAMINA__ERRORS__ERROR_STACK=false`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Also honor the plain `LOG_LEVEL` variable.
    ///
    /// Prefixed variables still take precedence.
    #[must_use]
    pub fn with_legacy_env(mut self) -> Self {
        self.legacy_env = true;
        self
    }

    /// Load a `.env` file into the process environment, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but cannot be loaded.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::Dotenv(e.to_string())),
        }
    }

    /// Applies environment overrides, validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable does not parse or
    /// the final configuration is invalid.
    pub fn load(mut self) -> Result<LaminaConfig, ConfigError> {
        if self.legacy_env {
            let value = env::var(LogLevel::ENV_VAR).ok();
            self.apply_legacy_level(value.as_deref());
        }

        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix, env::vars())?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Returns the configuration as layered so far, without environment
    /// overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> LaminaConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<LaminaConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn apply_legacy_level(&mut self, value: Option<&str>) {
        if let Some(level) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.config.logging.level = level.to_string();
        }
    }

    // Only `PREFIX__*` keys are considered; `PREFIX_HOME` or `PREFIXED` belong
    // to someone else.
    fn apply_env_overrides<I>(&mut self, prefix: &str, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let scope = format!("{prefix}__");
        let env_vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(k, _)| k.starts_with(&scope))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(key_without_prefix) = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
        else {
            return Ok(());
        };

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            ["LOGGING", "LEVEL"] => {
                value
                    .parse::<LogLevel>()
                    .map_err(|e| ConfigError::invalid_env(key, e.to_string()))?;
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = value
                    .parse()
                    .map_err(|_| ConfigError::invalid_env(key, "expected 'json' or 'pretty'"))?;
            }
            ["LOGGING", "DIRECTIVES"] => {
                self.config.logging.directives = Some(value.to_string());
            }
            ["ERRORS", "ERROR_STACK"] => {
                self.config.errors.error_stack = parse_bool(value)
                    .ok_or_else(|| ConfigError::invalid_env(key, "expected boolean"))?;
            }
            ["DISPATCH", "STRICT_NEXT"] => {
                self.config.dispatch.strict_next = parse_bool(value)
                    .ok_or_else(|| ConfigError::invalid_env(key, "expected boolean"))?;
            }
            // Unknown keys are ignored
            _ => {}
        }

        Ok(())
    }
}

// Parse boolean from string
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
