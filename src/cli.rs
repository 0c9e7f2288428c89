//! CLI argument parsing for metric-translator
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Translation rules file (default: translator.yaml, env: MTRANS_CONFIG)
//! - `--input` / `-i`: Batch file to translate, `-` for stdin (env: MTRANS_INPUT)
//! - `--output` / `-o`: Write the translated batch to a file instead of stdout
//! - `--validate`: Validate configuration and exit
//! - `--dry-run`: Show parsed rules and exit
//! - `--translate-dimension`: Print the translated name of a dimension key and exit
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: MTRANS_LOG_LEVEL)
//! - `--log-format`: Log line format (text/json, env: MTRANS_LOG_FORMAT)
//! - `--output-format`: Output format for batches and dry-run (text/json/yaml)
//!
//! # Precedence
//!
//! The log level is resolved in the following order (highest to lowest priority):
//! 1. `RUST_LOG`
//! 2. CLI argument or `MTRANS_LOG_LEVEL`
//! 3. `log_level` in the configuration file
//! 4. `info`

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// metric-translator - Rule-driven metric data point translation
///
/// Reads a batch of data points, applies the ordered translation rules
/// from the configuration file, and writes the translated batch.
#[derive(Parser, Debug)]
#[command(name = "metric-translator")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to translation rules file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "translator.yaml",
        env = "MTRANS_CONFIG"
    )]
    pub config: PathBuf,

    /// Batch file to translate (JSON, or YAML by extension). Reads stdin if omitted or "-"
    #[arg(short, long, value_name = "FILE", env = "MTRANS_INPUT")]
    pub input: Option<PathBuf>,

    /// Write the translated batch to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Validate configuration and exit
    #[arg(long)]
    pub validate: bool,

    /// Test configuration and show parsed rules
    #[arg(long)]
    pub dry_run: bool,

    /// Print the translated name of a dimension key and exit
    #[arg(long, value_name = "NAME")]
    pub translate_dimension: Option<String>,

    /// Log level (overrides config file)
    #[arg(short, long, value_enum, env = "MTRANS_LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", env = "MTRANS_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Output format for translated batches and --dry-run
    #[arg(long, value_enum, default_value = "json")]
    pub output_format: OutputFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl LogLevel {
    /// Parse a level name as written in the configuration file
    pub fn parse(s: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(s, true).ok()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log line format
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Output format options for translated batches and dry-run mode
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}
