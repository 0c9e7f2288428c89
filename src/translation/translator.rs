//! Metric Translator - rule-driven data point translation
//!
//! This module provides the engine that applies a validated, ordered list
//! of translation rules to batches of data points.
//!
//! Each rule consumes the working batch produced by the previous rule and
//! returns the next one, so rule order in configuration is significant.
//! Missing data and type mismatches never fail a batch: the affected data
//! point is left as is and a diagnostic is logged.

use std::collections::HashMap;

use super::aggregate::aggregate_data_points;
use super::datapoint::{DataPoint, Value};
use super::rules::{
    validate_rules, AggregationMethod, DimensionFilter, Operator, Rule, RuleConfig, RuleResult,
    ValueType,
};

/// Translation engine
///
/// Holds the validated rules and the dimension-rename lookup taken from the
/// `rename_dimension_keys` rule, if any. Immutable after construction, so a
/// single translator can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct MetricTranslator {
    /// Validated rules, in configured order
    rules: Vec<Rule>,
    /// Mapping of the `rename_dimension_keys` rule
    dimensions_map: HashMap<String, String>,
}

impl MetricTranslator {
    /// Create a translator from declared rules
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`](crate::error::RuleError) if any rule is
    /// malformed. No translator is produced in that case.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use metric_translator::translation::{Action, MetricTranslator, RuleConfig};
    ///
    /// let translator = MetricTranslator::new(&[
    ///     RuleConfig::new(Action::RenameMetrics).with_mapping([("cpu.pct", "cpu.usage")]),
    /// ])?;
    /// ```
    pub fn new(rules: &[RuleConfig]) -> RuleResult<Self> {
        let rules = validate_rules(rules)?;
        let dimensions_map = rules
            .iter()
            .find_map(|rule| match rule {
                Rule::RenameDimensionKeys { mapping } => Some(mapping.clone()),
                _ => None,
            })
            .unwrap_or_default();

        tracing::debug!(rules = rules.len(), "Metric translator created");

        Ok(Self {
            rules,
            dimensions_map,
        })
    }

    /// Create a translator with no rules
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get the validated rules
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Get the number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the translator has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule, in order, to a batch of data points
    ///
    /// The returned batch may be longer (copies, derived metrics) or shorter
    /// (aggregation) than the input.
    pub fn translate_data_points(&self, data_points: Vec<DataPoint>) -> Vec<DataPoint> {
        self.rules
            .iter()
            .fold(data_points, |batch, rule| apply_rule(rule, batch))
    }

    /// Translate a single dimension key
    ///
    /// Uses the `rename_dimension_keys` mapping; keys without a mapping are
    /// returned unchanged.
    pub fn translate_dimension<'a>(&'a self, orig: &'a str) -> &'a str {
        self.dimensions_map
            .get(orig)
            .map(String::as_str)
            .unwrap_or(orig)
    }
}

/// Apply one rule to the working batch
fn apply_rule(rule: &Rule, batch: Vec<DataPoint>) -> Vec<DataPoint> {
    tracing::trace!(
        action = %rule.action(),
        data_points = batch.len(),
        "Applying translation rule"
    );

    match rule {
        Rule::RenameDimensionKeys { mapping } => rename_dimension_keys(batch, mapping),
        Rule::RenameMetrics { mapping } => rename_metrics(batch, mapping),
        Rule::MultiplyInt { scale_factors } => {
            scale_int(batch, scale_factors, |v, f| v.wrapping_mul(f))
        }
        // Divisors are non-zero after validation
        Rule::DivideInt { scale_factors } => scale_int(batch, scale_factors, |v, f| v.wrapping_div(f)),
        Rule::MultiplyFloat { scale_factors } => multiply_float(batch, scale_factors),
        Rule::ConvertValues { types_mapping } => convert_values(batch, types_mapping),
        Rule::CopyMetrics { mapping, filter } => copy_metrics(batch, mapping, filter.as_ref()),
        Rule::SplitMetric {
            metric_name,
            dimension_key,
            mapping,
        } => split_metric(batch, metric_name, dimension_key, mapping),
        Rule::AggregateMetric {
            metric_name,
            dimensions,
            method,
        } => aggregate_metric(batch, metric_name, dimensions, *method),
        Rule::CalculateNewMetric {
            metric_name,
            operand1_metric,
            operand2_metric,
            operator,
        } => calculate_new_metric(batch, metric_name, operand1_metric, operand2_metric, *operator),
    }
}

fn rename_dimension_keys(
    mut batch: Vec<DataPoint>,
    mapping: &HashMap<String, String>,
) -> Vec<DataPoint> {
    for dimension in batch.iter_mut().flat_map(|dp| dp.dimensions.iter_mut()) {
        if let Some(new_key) = mapping.get(&dimension.key) {
            dimension.key.clone_from(new_key);
        }
    }
    batch
}

fn rename_metrics(mut batch: Vec<DataPoint>, mapping: &HashMap<String, String>) -> Vec<DataPoint> {
    for dp in &mut batch {
        if let Some(new_name) = mapping.get(&dp.metric) {
            dp.metric.clone_from(new_name);
        }
    }
    batch
}

fn scale_int(
    mut batch: Vec<DataPoint>,
    scale_factors: &HashMap<String, i64>,
    op: impl Fn(i64, i64) -> i64,
) -> Vec<DataPoint> {
    for dp in &mut batch {
        if let Some(&factor) = scale_factors.get(&dp.metric) {
            if let Some(v) = dp.value.int_mut() {
                *v = op(*v, factor);
            }
        }
    }
    batch
}

fn multiply_float(
    mut batch: Vec<DataPoint>,
    scale_factors: &HashMap<String, f64>,
) -> Vec<DataPoint> {
    for dp in &mut batch {
        if let Some(&factor) = scale_factors.get(&dp.metric) {
            if let Some(v) = dp.value.double_mut() {
                *v *= factor;
            }
        }
    }
    batch
}

fn convert_values(
    mut batch: Vec<DataPoint>,
    types_mapping: &HashMap<String, ValueType>,
) -> Vec<DataPoint> {
    for dp in &mut batch {
        let Some(&target) = types_mapping.get(&dp.metric) else {
            continue;
        };
        match target {
            ValueType::Int => match dp.value.as_double() {
                // `as` truncates toward zero
                Some(v) => dp.value = Value::Int(v as i64),
                None => tracing::debug!(
                    metric = %dp.metric,
                    "Only data points of \"double\" type can be converted to int"
                ),
            },
            ValueType::Double => match dp.value.as_int() {
                Some(v) => dp.value = Value::Double(v as f64),
                None => tracing::debug!(
                    metric = %dp.metric,
                    "Only data points of \"int\" type can be converted to double"
                ),
            },
        }
    }
    batch
}

fn copy_metrics(
    mut batch: Vec<DataPoint>,
    mapping: &HashMap<String, String>,
    filter: Option<&DimensionFilter>,
) -> Vec<DataPoint> {
    let copies: Vec<DataPoint> = batch
        .iter()
        .filter_map(|dp| {
            let new_name = mapping.get(&dp.metric)?;
            if let Some(filter) = filter {
                if !filter.allows(&dp.dimensions) {
                    tracing::trace!(
                        metric = %dp.metric,
                        dimension = %filter.key,
                        "Data point not copied: dimension filter not matched"
                    );
                    return None;
                }
            }
            let mut copy = dp.clone();
            copy.metric.clone_from(new_name);
            Some(copy)
        })
        .collect();

    batch.extend(copies);
    batch
}

fn split_metric(
    mut batch: Vec<DataPoint>,
    metric_name: &str,
    dimension_key: &str,
    mapping: &HashMap<String, String>,
) -> Vec<DataPoint> {
    for dp in batch.iter_mut().filter(|dp| dp.metric == metric_name) {
        // First dimension with the key decides
        let Some(pos) = dp.dimensions.iter().position(|d| d.key == dimension_key) else {
            continue;
        };
        if let Some(new_name) = mapping.get(&dp.dimensions[pos].value) {
            dp.metric.clone_from(new_name);
            dp.dimensions.remove(pos);
        }
    }
    batch
}

fn aggregate_metric(
    batch: Vec<DataPoint>,
    metric_name: &str,
    dimensions: &[String],
    method: AggregationMethod,
) -> Vec<DataPoint> {
    let (to_aggregate, mut others): (Vec<_>, Vec<_>) =
        batch.into_iter().partition(|dp| dp.metric == metric_name);

    others.extend(aggregate_data_points(to_aggregate, dimensions, method));
    others
}

/// Append `operand1 <operator> operand2` as a new metric
///
/// The first data point with each operand name is used. A point only ever
/// fills one operand slot, so when both operands name the same metric the
/// divisor is never found and nothing is appended.
fn calculate_new_metric(
    mut batch: Vec<DataPoint>,
    metric_name: &str,
    operand1_metric: &str,
    operand2_metric: &str,
    operator: Operator,
) -> Vec<DataPoint> {
    let new_point = {
        let operand1 = batch.iter().find(|dp| dp.metric == operand1_metric);
        let operand2 = batch
            .iter()
            .find(|dp| dp.metric == operand2_metric && dp.metric != operand1_metric);
        derive_data_point(metric_name, operand1, operand2, operand1_metric, operand2_metric, operator)
    };

    if let Some(dp) = new_point {
        batch.push(dp);
    }
    batch
}

fn derive_data_point(
    metric_name: &str,
    operand1: Option<&DataPoint>,
    operand2: Option<&DataPoint>,
    operand1_metric: &str,
    operand2_metric: &str,
    operator: Operator,
) -> Option<DataPoint> {
    let Some(operand1) = operand1 else {
        tracing::warn!(
            operand1_metric = %operand1_metric,
            metric_name = %metric_name,
            "calculate_new_metric: no matching data point found for operand1"
        );
        return None;
    };
    let Some(dividend) = operand1.value.as_int() else {
        tracing::warn!(
            operand1_metric = %operand1_metric,
            metric_name = %metric_name,
            "calculate_new_metric: operand1 has no int value"
        );
        return None;
    };
    let Some(operand2) = operand2 else {
        tracing::warn!(
            operand2_metric = %operand2_metric,
            metric_name = %metric_name,
            "calculate_new_metric: no matching data point found for operand2"
        );
        return None;
    };
    let Some(divisor) = operand2.value.as_int() else {
        tracing::warn!(
            operand2_metric = %operand2_metric,
            metric_name = %metric_name,
            "calculate_new_metric: operand2 has no int value"
        );
        return None;
    };

    let value = match operator {
        Operator::Division => {
            if divisor == 0 {
                tracing::warn!(
                    operand2_metric = %operand2_metric,
                    metric_name = %metric_name,
                    "calculate_new_metric: attempt to divide by zero, skipping"
                );
                return None;
            }
            dividend as f64 / divisor as f64
        }
    };

    let mut new_point = operand1.clone();
    new_point.metric = metric_name.to_string();
    new_point.value = Value::Double(value);
    Some(new_point)
}
