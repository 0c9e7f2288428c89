//! metric-translator library
//!
//! This crate provides a rule-driven translation engine for metric data
//! points: an ordered list of declarative rules renames, rescales,
//! retypes, copies, splits, aggregates and derives metrics in a batch.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod translation;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::cli::LogFormat;

/// Initialize the logging subsystem
///
/// Logs are written to stderr so that stdout carries only the batch.
///
/// # Arguments
/// * `level` - Log level string (trace, debug, info, warn, error)
/// * `format` - Plain text or JSON lines
///
/// # Errors
/// Returns an error if the logging system fails to initialize
pub fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = match format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
