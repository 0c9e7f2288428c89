//! Configuration management for metric-translator
//!
//! Handles loading and validating configuration from YAML files.
//!
//! # Example
//!
//! ```yaml
//! log_level: info
//! translation_rules:
//!   - action: rename_metrics
//!     mapping:
//!       cpu.pct: cpu.usage
//!   - action: multiply_float
//!     scale_factors_float:
//!       cpu.usage: 100.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::cli::LogLevel;
use crate::error::RuleError;
use crate::translation::{validate_rules, MetricTranslator, RuleConfig};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A translation rule is malformed
    #[error("Invalid translation rule: {0}")]
    Rule(#[from] RuleError),

    /// Validation error for configuration values
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Log level used when neither the CLI nor the environment sets one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Ordered translation rules
    #[serde(default)]
    pub translation_rules: Vec<RuleConfig>,
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if any
    /// translation rule is invalid
    ///
    /// # Note
    /// - If the file doesn't exist, returns `ConfigError::ReadError`
    /// - Use `Config::load_or_default()` if you want fallback to defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    ///
    /// The default configuration has no rules, so batches pass through unchanged.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Configured log level, if any
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Build a translator from the configured rules
    pub fn translator(&self) -> Result<MetricTranslator, ConfigError> {
        Ok(MetricTranslator::new(&self.translation_rules)?)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = &self.log_level {
            if LogLevel::parse(level).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log_level: {}",
                    level
                )));
            }
        }
        validate_rules(&self.translation_rules)?;
        Ok(())
    }
}
