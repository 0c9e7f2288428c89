//! Error types for metric-translator
//!
//! This module defines the error types used throughout the application.
//! Only rule configuration can fail; translating a batch never does.

use thiserror::Error;

/// Translation rule validation errors
///
/// Every variant carries the position of the offending rule in the
/// configured list.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// A field the action needs is unset
    #[error("rule {index}: fields {fields} are required for \"{action}\" translation rule")]
    MissingField {
        index: usize,
        action: String,
        fields: String,
    },

    /// A singleton action appears more than once
    #[error("rule {index}: only one \"{action}\" translation rule can be specified")]
    DuplicateRule { index: usize, action: String },

    /// `divide_int` with a zero divisor
    #[error(
        "rule {index}: \"scale_factors_int\" for \"divide_int\" translation rule has 0 value for \"{metric}\" metric"
    )]
    ZeroDivisor { index: usize, metric: String },

    /// `copy_metrics` filter key without allowed values
    #[error(
        "rule {index}: \"dimension_values\" has to be provided if \"dimension_key\" is set for \"copy_metrics\" translation rule"
    )]
    EmptyDimensionValues { index: usize },

    /// Unknown target in `types_mapping`
    #[error("rule {index}: invalid value type \"{value_type}\" set for metric \"{metric}\" in \"types_mapping\"")]
    InvalidValueType {
        index: usize,
        metric: String,
        value_type: String,
    },

    /// Unknown `aggregation_method`
    #[error("rule {index}: invalid \"aggregation_method\": \"{method}\" provided for \"aggregate_metric\" translation rule")]
    InvalidAggregationMethod { index: usize, method: String },

    /// Unsupported `operator`
    #[error("rule {index}: invalid operator \"{operator}\" for \"calculate_new_metric\" translation rule")]
    InvalidOperator { index: usize, operator: String },

    /// Unknown `action`
    #[error("rule {index}: unknown \"action\" value: \"{action}\"")]
    UnknownAction { index: usize, action: String },
}

impl RuleError {
    /// Index of the rule that failed validation
    pub fn index(&self) -> usize {
        match self {
            RuleError::MissingField { index, .. }
            | RuleError::DuplicateRule { index, .. }
            | RuleError::ZeroDivisor { index, .. }
            | RuleError::EmptyDimensionValues { index }
            | RuleError::InvalidValueType { index, .. }
            | RuleError::InvalidAggregationMethod { index, .. }
            | RuleError::InvalidOperator { index, .. }
            | RuleError::UnknownAction { index, .. } => *index,
        }
    }
}

/// Batch file errors
#[derive(Error, Debug)]
pub enum BatchError {
    /// Failed to read or write a batch
    #[error("Batch I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON batch could not be decoded or encoded
    #[error("Invalid JSON batch: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML batch could not be decoded or encoded
    #[error("Invalid YAML batch: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Translation rule error
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// Batch input/output error
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;
