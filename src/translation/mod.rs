//! Metric translation module
//!
//! This module applies declarative translation rules to batches of metric
//! data points: renaming, rescaling, retyping, copying, splitting,
//! aggregating and deriving metrics.

pub mod aggregate;
pub mod datapoint;
pub mod formatter;
pub mod rules;
pub mod translator;

pub use datapoint::{DataPoint, Dimension, MetricType, Value};
pub use formatter::TextFormatter;
pub use rules::{
    validate_rules, Action, AggregationMethod, DimensionFilter, Operator, Rule, RuleConfig,
    RuleResult, ValueType,
};
pub use translator::MetricTranslator;
