//! metric-translator - Rule-driven metric translation
//!
//! This binary reads a batch of metric data points, applies the
//! configured translation rules and writes the translated batch.

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, warn};

use metric_translator::{
    batch::{read_batch, render_batch},
    cli::{Cli, LogLevel, OutputFormat},
    config::Config,
    error::AppResult,
    translation::MetricTranslator,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging depends on the config's log_level, so a missing file is
    // reported once logging is up
    let config_found = cli.config.exists();
    let config = if config_found {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    let level = cli
        .log_level
        .or_else(|| config.log_level())
        .unwrap_or(LogLevel::Info);
    metric_translator::init_logging(&level.to_string(), cli.log_format)?;

    if !config_found {
        warn!(
            path = %cli.config.display(),
            "Config file not found, batches pass through unchanged"
        );
    }

    let translator = build_translator(&config)?;
    debug!(rules = translator.len(), "Translation rules loaded");

    if cli.validate {
        println!("Configuration is valid");
        println!("  Rules: {}", translator.len());
        return Ok(());
    }

    if cli.dry_run {
        print!("{}", render_rules(&config, &translator, cli.output_format)?);
        return Ok(());
    }

    if let Some(name) = &cli.translate_dimension {
        println!("{}", translator.translate_dimension(name));
        return Ok(());
    }

    let rendered = translate(&cli, &translator)?;
    match &cli.output {
        Some(path) => write_output(path, &rendered)?,
        None => print!("{}", rendered),
    }

    Ok(())
}

fn build_translator(config: &Config) -> AppResult<MetricTranslator> {
    Ok(MetricTranslator::new(&config.translation_rules)?)
}

/// Read, translate and render one batch
fn translate(cli: &Cli, translator: &MetricTranslator) -> AppResult<String> {
    let batch = read_batch(cli.input.as_deref())?;
    let received = batch.len();

    let translated = translator.translate_data_points(batch);
    info!(
        received,
        emitted = translated.len(),
        "Batch translated"
    );

    Ok(render_batch(&translated, cli.output_format)?)
}

fn write_output(path: &Path, rendered: &str) -> AppResult<()> {
    std::fs::write(path, rendered).map_err(metric_translator::error::BatchError::from)?;
    debug!(path = %path.display(), "Batch written");
    Ok(())
}

/// Render the parsed rules for `--dry-run`
fn render_rules(
    config: &Config,
    translator: &MetricTranslator,
    format: OutputFormat,
) -> Result<String> {
    let rendered = match format {
        OutputFormat::Text => {
            let mut out = format!("Translation rules ({}):\n", translator.len());
            for (i, rule) in translator.rules().iter().enumerate() {
                out.push_str(&format!("  {}. {}\n", i + 1, rule));
            }
            out
        }
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&config.translation_rules)?;
            json.push('\n');
            json
        }
        OutputFormat::Yaml => serde_yaml::to_string(&config.translation_rules)?,
    };
    Ok(rendered)
}
