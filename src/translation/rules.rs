//! Translation rule definitions and validation
//!
//! Rules are declared as [`RuleConfig`] records: an `action` tag plus the
//! optional payload fields that action reads. [`validate_rules`] checks the
//! whole list up front and turns each record into a [`Rule`], a closed enum
//! whose variants carry exactly the fields their action uses.
//!
//! # Example Configuration (YAML)
//!
//! ```yaml
//! - action: rename_metrics
//!   mapping:
//!     cpu.pct: cpu.usage
//! - action: aggregate_metric
//!   metric_name: machine_cpu_cores
//!   aggregation_method: count
//!   dimensions:
//!     - host
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};

use super::datapoint::Dimension;
use crate::error::RuleError;

/// Result type for rule operations
pub type RuleResult<T> = Result<T, RuleError>;

/// Translation action selected by a rule's `action` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Rename dimension keys using `mapping`
    RenameDimensionKeys,
    /// Rename metrics using `mapping`
    RenameMetrics,
    /// Multiply integer values by `scale_factors_int`
    MultiplyInt,
    /// Divide integer values by `scale_factors_int`
    DivideInt,
    /// Multiply floating-point values by `scale_factors_float`
    MultiplyFloat,
    /// Convert values between int and double using `types_mapping`
    ConvertValues,
    /// Copy metrics under new names using `mapping`, optionally filtered
    CopyMetrics,
    /// Rename a metric based on one of its dimension values
    SplitMetric,
    /// Aggregate a metric over a subset of its dimensions
    AggregateMetric,
    /// Derive a new metric from two operand metrics
    CalculateNewMetric,
}

impl Action {
    /// All actions, in declaration order
    pub const ALL: [Action; 10] = [
        Action::RenameDimensionKeys,
        Action::RenameMetrics,
        Action::MultiplyInt,
        Action::DivideInt,
        Action::MultiplyFloat,
        Action::ConvertValues,
        Action::CopyMetrics,
        Action::SplitMetric,
        Action::AggregateMetric,
        Action::CalculateNewMetric,
    ];

    /// Returns the configuration string of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::RenameDimensionKeys => "rename_dimension_keys",
            Action::RenameMetrics => "rename_metrics",
            Action::MultiplyInt => "multiply_int",
            Action::DivideInt => "divide_int",
            Action::MultiplyFloat => "multiply_float",
            Action::ConvertValues => "convert_values",
            Action::CopyMetrics => "copy_metrics",
            Action::SplitMetric => "split_metric",
            Action::AggregateMetric => "aggregate_metric",
            Action::CalculateNewMetric => "calculate_new_metric",
        }
    }

    /// Parse a configuration string
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target representation for `convert_values`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Double,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Double => "double",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "int" => Some(ValueType::Int),
            "double" => Some(ValueType::Double),
            _ => None,
        }
    }
}

/// Reduction applied by `aggregate_metric`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMethod {
    /// Number of data points in the group
    Count,
    /// Sum of the group's values, per representation
    Sum,
}

impl AggregationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationMethod::Count => "count",
            AggregationMethod::Sum => "sum",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "count" => Some(AggregationMethod::Count),
            "sum" => Some(AggregationMethod::Sum),
            _ => None,
        }
    }
}

/// Binary operator for `calculate_new_metric`
///
/// Only division is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Division,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Division => "/",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "/" => Some(Operator::Division),
            _ => None,
        }
    }
}

/// Declarative translation rule, as written in configuration
///
/// Only `action` is required by the decoder. Which of the remaining fields
/// must be set depends on the action and is checked by [`RuleConfig::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Translation action to apply
    pub action: String,

    /// Key/value mapping for rename_dimension_keys, rename_metrics,
    /// copy_metrics and split_metric
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<HashMap<String, String>>,

    /// metric name -> integer factor, for multiply_int and divide_int
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_factors_int: Option<HashMap<String, i64>>,

    /// metric name -> float factor, for multiply_float
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_factors_float: Option<HashMap<String, f64>>,

    /// Metric to split, aggregate, or the name of a derived metric
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<String>,

    /// Dimension inspected by split_metric, or filter key for copy_metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_key: Option<String>,

    /// Allowed values of `dimension_key` for copy_metrics
    ///
    /// Accepts either a list of values or a map of `value: bool`. A list
    /// enables every listed value.
    #[serde(
        default,
        deserialize_with = "deserialize_dimension_values",
        skip_serializing_if = "Option::is_none"
    )]
    pub dimension_values: Option<HashMap<String, bool>>,

    /// metric name -> target value type (`int` or `double`), for convert_values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types_mapping: Option<HashMap<String, String>>,

    /// `count` or `sum`, for aggregate_metric
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_method: Option<String>,

    /// Dimension keys to aggregate by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Vec<String>>,

    /// Dividend metric for calculate_new_metric
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operand1_metric: Option<String>,

    /// Divisor metric for calculate_new_metric
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operand2_metric: Option<String>,

    /// Operator for calculate_new_metric
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DimensionValuesRepr {
    List(Vec<String>),
    Flags(HashMap<String, bool>),
}

fn deserialize_dimension_values<'de, D>(
    deserializer: D,
) -> Result<Option<HashMap<String, bool>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<DimensionValuesRepr>::deserialize(deserializer)?;
    Ok(raw.map(|repr| match repr {
        DimensionValuesRepr::List(values) => values.into_iter().map(|v| (v, true)).collect(),
        DimensionValuesRepr::Flags(flags) => flags,
    }))
}

impl RuleConfig {
    /// Create a rule with only the action set
    pub fn new(action: Action) -> Self {
        Self {
            action: action.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Set the mapping from string pairs
    pub fn with_mapping<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.mapping = Some(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Set integer scale factors
    pub fn with_scale_factors_int<K: Into<String>>(
        mut self,
        factors: impl IntoIterator<Item = (K, i64)>,
    ) -> Self {
        self.scale_factors_int = Some(factors.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    /// Set float scale factors
    pub fn with_scale_factors_float<K: Into<String>>(
        mut self,
        factors: impl IntoIterator<Item = (K, f64)>,
    ) -> Self {
        self.scale_factors_float = Some(factors.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    /// Set the metric name
    pub fn with_metric_name(mut self, name: impl Into<String>) -> Self {
        self.metric_name = Some(name.into());
        self
    }

    /// Set the dimension key
    pub fn with_dimension_key(mut self, key: impl Into<String>) -> Self {
        self.dimension_key = Some(key.into());
        self
    }

    /// Set allowed dimension values
    pub fn with_dimension_values<V: Into<String>>(
        mut self,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.dimension_values = Some(values.into_iter().map(|v| (v.into(), true)).collect());
        self
    }

    /// Set the types mapping
    pub fn with_types_mapping<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.types_mapping = Some(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Set the aggregation method
    pub fn with_aggregation_method(mut self, method: impl Into<String>) -> Self {
        self.aggregation_method = Some(method.into());
        self
    }

    /// Set the dimension keys to aggregate by
    pub fn with_dimensions<V: Into<String>>(mut self, keys: impl IntoIterator<Item = V>) -> Self {
        self.dimensions = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Set both operands and the operator
    pub fn with_operands(
        mut self,
        operand1: impl Into<String>,
        operator: impl Into<String>,
        operand2: impl Into<String>,
    ) -> Self {
        self.operand1_metric = Some(operand1.into());
        self.operator = Some(operator.into());
        self.operand2_metric = Some(operand2.into());
        self
    }

    /// Validate this rule and convert it into a [`Rule`]
    ///
    /// `index` is the rule's position in the configured list and is only
    /// used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] if a required field is unset or an
    /// enumerated value is invalid.
    pub fn validate(&self, index: usize) -> RuleResult<Rule> {
        let action = Action::parse(&self.action).ok_or_else(|| RuleError::UnknownAction {
            index,
            action: self.action.clone(),
        })?;
        let missing = |fields: &[&str]| RuleError::MissingField {
            index,
            action: action.as_str().to_string(),
            fields: quote_fields(fields),
        };

        let rule = match action {
            Action::RenameDimensionKeys => Rule::RenameDimensionKeys {
                mapping: self.mapping.clone().ok_or_else(|| missing(&["mapping"]))?,
            },
            Action::RenameMetrics => Rule::RenameMetrics {
                mapping: self.mapping.clone().ok_or_else(|| missing(&["mapping"]))?,
            },
            Action::MultiplyInt => Rule::MultiplyInt {
                scale_factors: self
                    .scale_factors_int
                    .clone()
                    .ok_or_else(|| missing(&["scale_factors_int"]))?,
            },
            Action::DivideInt => {
                let scale_factors = self
                    .scale_factors_int
                    .clone()
                    .ok_or_else(|| missing(&["scale_factors_int"]))?;
                if let Some((metric, _)) = scale_factors.iter().find(|(_, v)| **v == 0) {
                    return Err(RuleError::ZeroDivisor {
                        index,
                        metric: metric.clone(),
                    });
                }
                Rule::DivideInt { scale_factors }
            }
            Action::MultiplyFloat => Rule::MultiplyFloat {
                scale_factors: self
                    .scale_factors_float
                    .clone()
                    .ok_or_else(|| missing(&["scale_factors_float"]))?,
            },
            Action::ConvertValues => {
                let raw = self
                    .types_mapping
                    .as_ref()
                    .ok_or_else(|| missing(&["types_mapping"]))?;
                let mut types_mapping = HashMap::with_capacity(raw.len());
                for (metric, value_type) in raw {
                    let parsed =
                        ValueType::parse(value_type).ok_or_else(|| RuleError::InvalidValueType {
                            index,
                            metric: metric.clone(),
                            value_type: value_type.clone(),
                        })?;
                    types_mapping.insert(metric.clone(), parsed);
                }
                Rule::ConvertValues { types_mapping }
            }
            Action::CopyMetrics => {
                let mapping = self.mapping.clone().ok_or_else(|| missing(&["mapping"]))?;
                let filter = match non_empty(&self.dimension_key) {
                    // Disabled entries count as configured but never match
                    Some(key) => match &self.dimension_values {
                        Some(values) if !values.is_empty() => Some(DimensionFilter {
                            key: key.to_string(),
                            values: values
                                .iter()
                                .filter(|(_, allowed)| **allowed)
                                .map(|(value, _)| value.clone())
                                .collect(),
                        }),
                        _ => return Err(RuleError::EmptyDimensionValues { index }),
                    },
                    None => None,
                };
                Rule::CopyMetrics { mapping, filter }
            }
            Action::SplitMetric => {
                match (
                    non_empty(&self.metric_name),
                    non_empty(&self.dimension_key),
                    &self.mapping,
                ) {
                    (Some(metric_name), Some(dimension_key), Some(mapping)) => Rule::SplitMetric {
                        metric_name: metric_name.to_string(),
                        dimension_key: dimension_key.to_string(),
                        mapping: mapping.clone(),
                    },
                    _ => return Err(missing(&["metric_name", "dimension_key", "mapping"])),
                }
            }
            Action::AggregateMetric => {
                let fields = ["metric_name", "dimensions", "aggregation_method"];
                let metric_name = non_empty(&self.metric_name).ok_or_else(|| missing(&fields))?;
                let dimensions = self
                    .dimensions
                    .as_ref()
                    .filter(|d| !d.is_empty())
                    .ok_or_else(|| missing(&fields))?;
                let method = non_empty(&self.aggregation_method).ok_or_else(|| missing(&fields))?;
                let method = AggregationMethod::parse(method).ok_or_else(|| {
                    RuleError::InvalidAggregationMethod {
                        index,
                        method: method.to_string(),
                    }
                })?;
                Rule::AggregateMetric {
                    metric_name: metric_name.to_string(),
                    dimensions: dimensions.clone(),
                    method,
                }
            }
            Action::CalculateNewMetric => {
                let fields = [
                    "metric_name",
                    "operand1_metric",
                    "operand2_metric",
                    "operator",
                ];
                match (
                    non_empty(&self.metric_name),
                    non_empty(&self.operand1_metric),
                    non_empty(&self.operand2_metric),
                    non_empty(&self.operator),
                ) {
                    (Some(metric_name), Some(operand1), Some(operand2), Some(operator)) => {
                        let operator =
                            Operator::parse(operator).ok_or_else(|| RuleError::InvalidOperator {
                                index,
                                operator: operator.to_string(),
                            })?;
                        Rule::CalculateNewMetric {
                            metric_name: metric_name.to_string(),
                            operand1_metric: operand1.to_string(),
                            operand2_metric: operand2.to_string(),
                            operator,
                        }
                    }
                    _ => return Err(missing(&fields)),
                }
            }
        };

        Ok(rule)
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

fn quote_fields(fields: &[&str]) -> String {
    let quoted: Vec<String> = fields.iter().map(|f| format!("\"{}\"", f)).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{}, and {}", rest.join(", "), last),
        _ => quoted.join(""),
    }
}

/// Dimension filter for `copy_metrics`
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionFilter {
    /// Dimension key to inspect
    pub key: String,
    /// Values of `key` that allow a copy
    pub values: HashSet<String>,
}

impl DimensionFilter {
    /// Whether the first dimension named `key` carries an allowed value
    pub fn allows(&self, dimensions: &[Dimension]) -> bool {
        dimensions
            .iter()
            .find(|d| d.key == self.key)
            .is_some_and(|d| self.values.contains(&d.value))
    }
}

/// Validated translation rule
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    RenameDimensionKeys {
        mapping: HashMap<String, String>,
    },
    RenameMetrics {
        mapping: HashMap<String, String>,
    },
    MultiplyInt {
        scale_factors: HashMap<String, i64>,
    },
    /// Divisors are guaranteed non-zero
    DivideInt {
        scale_factors: HashMap<String, i64>,
    },
    MultiplyFloat {
        scale_factors: HashMap<String, f64>,
    },
    ConvertValues {
        types_mapping: HashMap<String, ValueType>,
    },
    CopyMetrics {
        mapping: HashMap<String, String>,
        filter: Option<DimensionFilter>,
    },
    SplitMetric {
        metric_name: String,
        dimension_key: String,
        mapping: HashMap<String, String>,
    },
    AggregateMetric {
        metric_name: String,
        dimensions: Vec<String>,
        method: AggregationMethod,
    },
    CalculateNewMetric {
        metric_name: String,
        operand1_metric: String,
        operand2_metric: String,
        operator: Operator,
    },
}

impl Rule {
    /// Action this rule performs
    pub fn action(&self) -> Action {
        match self {
            Rule::RenameDimensionKeys { .. } => Action::RenameDimensionKeys,
            Rule::RenameMetrics { .. } => Action::RenameMetrics,
            Rule::MultiplyInt { .. } => Action::MultiplyInt,
            Rule::DivideInt { .. } => Action::DivideInt,
            Rule::MultiplyFloat { .. } => Action::MultiplyFloat,
            Rule::ConvertValues { .. } => Action::ConvertValues,
            Rule::CopyMetrics { .. } => Action::CopyMetrics,
            Rule::SplitMetric { .. } => Action::SplitMetric,
            Rule::AggregateMetric { .. } => Action::AggregateMetric,
            Rule::CalculateNewMetric { .. } => Action::CalculateNewMetric,
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::RenameDimensionKeys { mapping }
            | Rule::RenameMetrics { mapping }
            | Rule::CopyMetrics {
                mapping,
                filter: None,
            } => write!(f, "{} ({} mappings)", self.action(), mapping.len()),
            Rule::CopyMetrics {
                mapping,
                filter: Some(filter),
            } => write!(
                f,
                "{} ({} mappings, filter {} in {} values)",
                self.action(),
                mapping.len(),
                filter.key,
                filter.values.len()
            ),
            Rule::MultiplyInt { scale_factors } | Rule::DivideInt { scale_factors } => {
                write!(f, "{} ({} metrics)", self.action(), scale_factors.len())
            }
            Rule::MultiplyFloat { scale_factors } => {
                write!(f, "{} ({} metrics)", self.action(), scale_factors.len())
            }
            Rule::ConvertValues { types_mapping } => {
                write!(f, "{} ({} metrics)", self.action(), types_mapping.len())
            }
            Rule::SplitMetric {
                metric_name,
                dimension_key,
                mapping,
            } => write!(
                f,
                "{} {} by {} ({} mappings)",
                self.action(),
                metric_name,
                dimension_key,
                mapping.len()
            ),
            Rule::AggregateMetric {
                metric_name,
                dimensions,
                method,
            } => write!(
                f,
                "{} {} {} by [{}]",
                self.action(),
                method.as_str(),
                metric_name,
                dimensions.join(", ")
            ),
            Rule::CalculateNewMetric {
                metric_name,
                operand1_metric,
                operand2_metric,
                operator,
            } => write!(
                f,
                "{} {} = {} {} {}",
                self.action(),
                metric_name,
                operand1_metric,
                operator.as_str(),
                operand2_metric
            ),
        }
    }
}

/// Validate a rule list
///
/// Either every rule is well-formed and the validated list is returned in
/// the same order, or the first defect is reported.
///
/// # Errors
///
/// Returns the first [`RuleError`] found, including a second
/// `rename_dimension_keys` rule.
pub fn validate_rules(rules: &[RuleConfig]) -> RuleResult<Vec<Rule>> {
    let mut rename_dimension_keys_found = false;
    let mut validated = Vec::with_capacity(rules.len());

    for (index, config) in rules.iter().enumerate() {
        let rule = config.validate(index)?;
        if rule.action() == Action::RenameDimensionKeys {
            if rename_dimension_keys_found {
                return Err(RuleError::DuplicateRule {
                    index,
                    action: Action::RenameDimensionKeys.as_str().to_string(),
                });
            }
            rename_dimension_keys_found = true;
        }
        validated.push(rule);
    }

    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Enum tests
    // ==========================================================================

    #[test]
    fn test_action_parse_roundtrip() {
        for action in Action::ALL {
            assert_eq!(Action::parse(action.as_str()), Some(action));
        }
        assert_eq!(Action::parse("RENAME_METRICS"), None);
        assert_eq!(Action::parse(""), None);
    }

    #[test]
    fn test_closed_enums_reject_unknown() {
        assert_eq!(ValueType::parse("float"), None);
        assert_eq!(AggregationMethod::parse("avg"), None);
        assert_eq!(Operator::parse("*"), None);
        assert_eq!(Operator::parse("/"), Some(Operator::Division));
    }

    // ==========================================================================
    // Validation tests
    // ==========================================================================

    #[test]
    fn test_validate_requires_mapping() {
        for action in [
            Action::RenameDimensionKeys,
            Action::RenameMetrics,
            Action::CopyMetrics,
        ] {
            let err = RuleConfig::new(action).validate(0).unwrap_err();
            assert!(
                matches!(err, RuleError::MissingField { ref fields, .. } if fields == "\"mapping\""),
                "unexpected error for {}: {:?}",
                action,
                err
            );
        }
    }

    #[test]
    fn test_validate_empty_mapping_is_accepted() {
        let rule = RuleConfig::new(Action::RenameMetrics)
            .with_mapping(Vec::<(String, String)>::new())
            .validate(0)
            .unwrap();
        assert_eq!(
            rule,
            Rule::RenameMetrics {
                mapping: HashMap::new()
            }
        );
    }

    #[test]
    fn test_validate_scale_factors() {
        assert!(RuleConfig::new(Action::MultiplyInt).validate(0).is_err());
        assert!(RuleConfig::new(Action::DivideInt).validate(0).is_err());
        assert!(RuleConfig::new(Action::MultiplyFloat).validate(0).is_err());

        let ok = RuleConfig::new(Action::DivideInt)
            .with_scale_factors_int([("disk.ops", 60)])
            .validate(0);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_validate_divide_int_zero_divisor() {
        let err = RuleConfig::new(Action::DivideInt)
            .with_scale_factors_int([("good", 10), ("bad", 0)])
            .validate(4)
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::ZeroDivisor {
                index: 4,
                metric: "bad".to_string()
            }
        );
    }

    #[test]
    fn test_validate_multiply_int_allows_zero() {
        let rule = RuleConfig::new(Action::MultiplyInt)
            .with_scale_factors_int([("m", 0)])
            .validate(0);
        assert!(rule.is_ok());
    }

    #[test]
    fn test_validate_convert_values() {
        assert!(RuleConfig::new(Action::ConvertValues).validate(0).is_err());

        let err = RuleConfig::new(Action::ConvertValues)
            .with_types_mapping([("m", "float")])
            .validate(0)
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidValueType { ref value_type, .. } if value_type == "float"));

        let rule = RuleConfig::new(Action::ConvertValues)
            .with_types_mapping([("a", "int"), ("b", "double")])
            .validate(0)
            .unwrap();
        match rule {
            Rule::ConvertValues { types_mapping } => {
                assert_eq!(types_mapping.get("a"), Some(&ValueType::Int));
                assert_eq!(types_mapping.get("b"), Some(&ValueType::Double));
            }
            other => panic!("Expected ConvertValues, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_copy_metrics_filter() {
        let err = RuleConfig::new(Action::CopyMetrics)
            .with_mapping([("a", "b")])
            .with_dimension_key("direction")
            .validate(1)
            .unwrap_err();
        assert_eq!(err, RuleError::EmptyDimensionValues { index: 1 });

        let err = RuleConfig::new(Action::CopyMetrics)
            .with_mapping([("a", "b")])
            .with_dimension_key("direction")
            .with_dimension_values(Vec::<String>::new())
            .validate(1)
            .unwrap_err();
        assert_eq!(err, RuleError::EmptyDimensionValues { index: 1 });

        let rule = RuleConfig::new(Action::CopyMetrics)
            .with_mapping([("a", "b")])
            .with_dimension_key("direction")
            .with_dimension_values(["receive"])
            .validate(1)
            .unwrap();
        match rule {
            Rule::CopyMetrics {
                filter: Some(filter),
                ..
            } => {
                assert_eq!(filter.key, "direction");
                assert!(filter.values.contains("receive"));
            }
            other => panic!("Expected filtered CopyMetrics, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_copy_metrics_disabled_values_accepted() {
        let rule: RuleConfig = serde_yaml::from_str(
            r#"
action: copy_metrics
mapping: {a: b}
dimension_key: state
dimension_values:
  cached: false
"#,
        )
        .unwrap();
        match rule.validate(0).unwrap() {
            Rule::CopyMetrics {
                filter: Some(filter),
                ..
            } => {
                assert_eq!(filter.key, "state");
                assert!(filter.values.is_empty());
                assert!(!filter.allows(&[Dimension::new("state", "cached")]));
            }
            other => panic!("Expected filtered CopyMetrics, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_copy_metrics_without_filter_key() {
        // Values without a key are ignored
        let rule = RuleConfig::new(Action::CopyMetrics)
            .with_mapping([("a", "b")])
            .with_dimension_values(["x"])
            .validate(0)
            .unwrap();
        assert!(matches!(rule, Rule::CopyMetrics { filter: None, .. }));
    }

    #[test]
    fn test_validate_split_metric() {
        let err = RuleConfig::new(Action::SplitMetric)
            .with_metric_name("k8s.pod.network.io")
            .with_mapping([("receive", "rx")])
            .validate(0)
            .unwrap_err();
        match err {
            RuleError::MissingField { fields, .. } => {
                assert_eq!(fields, "\"metric_name\", \"dimension_key\", and \"mapping\"");
            }
            other => panic!("Expected MissingField, got {:?}", other),
        }

        let ok = RuleConfig::new(Action::SplitMetric)
            .with_metric_name("k8s.pod.network.io")
            .with_dimension_key("direction")
            .with_mapping([("receive", "rx")])
            .validate(0);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_validate_aggregate_metric() {
        let base = RuleConfig::new(Action::AggregateMetric)
            .with_metric_name("machine_cpu_cores")
            .with_dimensions(["host"]);

        let err = base.clone().validate(0).unwrap_err();
        assert!(matches!(err, RuleError::MissingField { .. }));

        let err = base
            .clone()
            .with_aggregation_method("avg")
            .validate(0)
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidAggregationMethod { ref method, .. } if method == "avg"));

        let err = base
            .clone()
            .with_dimensions(Vec::<String>::new())
            .with_aggregation_method("count")
            .validate(0)
            .unwrap_err();
        assert!(matches!(err, RuleError::MissingField { .. }));

        let rule = base.with_aggregation_method("sum").validate(0).unwrap();
        assert_eq!(
            rule,
            Rule::AggregateMetric {
                metric_name: "machine_cpu_cores".to_string(),
                dimensions: vec!["host".to_string()],
                method: AggregationMethod::Sum,
            }
        );
    }

    #[test]
    fn test_validate_calculate_new_metric() {
        let err = RuleConfig::new(Action::CalculateNewMetric)
            .with_metric_name("memory.utilization")
            .validate(0)
            .unwrap_err();
        assert!(matches!(err, RuleError::MissingField { .. }));

        let err = RuleConfig::new(Action::CalculateNewMetric)
            .with_metric_name("memory.utilization")
            .with_operands("memory.used", "*", "memory.total")
            .validate(0)
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidOperator { ref operator, .. } if operator == "*"));

        let rule = RuleConfig::new(Action::CalculateNewMetric)
            .with_metric_name("memory.utilization")
            .with_operands("memory.used", "/", "memory.total")
            .validate(0)
            .unwrap();
        assert_eq!(rule.action(), Action::CalculateNewMetric);
    }

    #[test]
    fn test_validate_empty_strings_are_unset() {
        let err = RuleConfig::new(Action::SplitMetric)
            .with_metric_name("")
            .with_dimension_key("direction")
            .with_mapping([("a", "b")])
            .validate(0)
            .unwrap_err();
        assert!(matches!(err, RuleError::MissingField { .. }));
    }

    #[test]
    fn test_validate_unknown_action() {
        let rule = RuleConfig {
            action: "explode_metric".to_string(),
            ..RuleConfig::default()
        };
        let err = rule.validate(7).unwrap_err();
        assert_eq!(
            err,
            RuleError::UnknownAction {
                index: 7,
                action: "explode_metric".to_string()
            }
        );
    }

    #[test]
    fn test_validate_rules_single_rename_dimension_keys() {
        let rules = vec![
            RuleConfig::new(Action::RenameDimensionKeys).with_mapping([("a", "b")]),
            RuleConfig::new(Action::RenameMetrics).with_mapping([("m", "n")]),
            RuleConfig::new(Action::RenameDimensionKeys).with_mapping([("c", "d")]),
        ];
        let err = validate_rules(&rules).unwrap_err();
        assert_eq!(
            err,
            RuleError::DuplicateRule {
                index: 2,
                action: "rename_dimension_keys".to_string()
            }
        );
    }

    #[test]
    fn test_validate_rules_preserves_order() {
        let rules = vec![
            RuleConfig::new(Action::RenameMetrics).with_mapping([("m", "n")]),
            RuleConfig::new(Action::MultiplyFloat).with_scale_factors_float([("n", 2.0)]),
        ];
        let validated = validate_rules(&rules).unwrap();
        let actions: Vec<_> = validated.iter().map(Rule::action).collect();
        assert_eq!(actions, vec![Action::RenameMetrics, Action::MultiplyFloat]);
    }

    #[test]
    fn test_validate_rules_reports_first_error() {
        let rules = vec![
            RuleConfig::new(Action::RenameMetrics),
            RuleConfig::new(Action::DivideInt).with_scale_factors_int([("m", 0)]),
        ];
        assert_eq!(validate_rules(&rules).unwrap_err().index(), 0);
    }

    // ==========================================================================
    // YAML decoding tests
    // ==========================================================================

    #[test]
    fn test_yaml_rule_list() {
        let yaml = r#"
- action: rename_dimension_keys
  mapping:
    k8s.pod.name: kubernetes_pod_name
- action: split_metric
  metric_name: k8s.pod.network.io
  dimension_key: direction
  mapping:
    receive: pod_network_receive_bytes_total
    transmit: pod_network_transmit_bytes_total
- action: calculate_new_metric
  metric_name: memory.utilization
  operand1_metric: memory.used
  operand2_metric: memory.total
  operator: /
"#;
        let configs: Vec<RuleConfig> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(configs.len(), 3);
        assert_eq!(configs[1].dimension_key.as_deref(), Some("direction"));

        let rules = validate_rules(&configs).unwrap();
        assert_eq!(rules[2].action(), Action::CalculateNewMetric);
    }

    #[test]
    fn test_yaml_dimension_values_list_or_map() {
        let list: RuleConfig = serde_yaml::from_str(
            r#"
action: copy_metrics
mapping: {a: b}
dimension_key: state
dimension_values: [used, free]
"#,
        )
        .unwrap();
        let values = list.dimension_values.unwrap();
        assert_eq!(values.get("used"), Some(&true));
        assert_eq!(values.get("free"), Some(&true));

        let map: RuleConfig = serde_yaml::from_str(
            r#"
action: copy_metrics
mapping: {a: b}
dimension_key: state
dimension_values:
  used: true
  cached: false
"#,
        )
        .unwrap();
        let values = map.dimension_values.unwrap();
        assert_eq!(values.get("used"), Some(&true));
        assert_eq!(values.get("cached"), Some(&false));
    }

    #[test]
    fn test_rule_display() {
        let rule = RuleConfig::new(Action::AggregateMetric)
            .with_metric_name("cpu")
            .with_dimensions(["host", "zone"])
            .with_aggregation_method("count")
            .validate(0)
            .unwrap();
        assert_eq!(rule.to_string(), "aggregate_metric count cpu by [host, zone]");
    }
}
