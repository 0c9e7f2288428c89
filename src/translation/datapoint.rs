//! Data point model
//!
//! This module defines the records the translator operates on: a data point
//! carries a metric name, a timestamp, an ordered list of dimensions and a
//! typed numeric value.
//!
//! # Serialized Form
//!
//! ```json
//! {
//!   "metric": "cpu.utilization",
//!   "timestamp": 1609459200000,
//!   "dimensions": [{"key": "host", "value": "host1"}],
//!   "value": {"doubleValue": 0.42},
//!   "metricType": "gauge"
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Kind of metric a data point reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// A value that can go up and down
    Gauge,
    /// A delta count since the previous report
    Counter,
    /// A monotonically increasing running total
    CumulativeCounter,
}

impl MetricType {
    /// Returns the string representation used in batch files
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
            MetricType::CumulativeCounter => "cumulative_counter",
        }
    }
}

impl Serialize for MetricType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MetricType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "gauge" => Ok(MetricType::Gauge),
            "counter" => Ok(MetricType::Counter),
            "cumulative_counter" => Ok(MetricType::CumulativeCounter),
            other => Err(serde::de::Error::custom(format!(
                "unknown metric type '{}', expected one of: gauge, counter, cumulative_counter",
                other
            ))),
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Numeric value carried by a data point
///
/// Producers set at most one representation. `IntAndDouble` only comes out
/// of `sum` aggregation, where integer and floating-point contributions are
/// accumulated independently.
///
/// JSON has no encoding for NaN or infinities: `serde_json` writes them as
/// `null`, so a non-finite `Double` reads back from JSON as `Absent`. YAML
/// and text output keep them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Datum", into = "Datum")]
pub enum Value {
    /// No value present
    #[default]
    Absent,
    /// Integer value
    Int(i64),
    /// Floating-point value
    Double(f64),
    /// Both representations, from summing a mixed group
    IntAndDouble { int: i64, double: f64 },
}

impl Value {
    /// Integer representation, if held
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(v) | Value::IntAndDouble { int: v, .. } => Some(v),
            Value::Absent | Value::Double(_) => None,
        }
    }

    /// Floating-point representation, if held
    pub fn as_double(&self) -> Option<f64> {
        match *self {
            Value::Double(v) | Value::IntAndDouble { double: v, .. } => Some(v),
            Value::Absent | Value::Int(_) => None,
        }
    }

    /// Mutable access to the integer representation
    pub fn int_mut(&mut self) -> Option<&mut i64> {
        match self {
            Value::Int(v) | Value::IntAndDouble { int: v, .. } => Some(v),
            Value::Absent | Value::Double(_) => None,
        }
    }

    /// Mutable access to the floating-point representation
    pub fn double_mut(&mut self) -> Option<&mut f64> {
        match self {
            Value::Double(v) | Value::IntAndDouble { double: v, .. } => Some(v),
            Value::Absent | Value::Int(_) => None,
        }
    }

    /// Whether no representation is present
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Build a value from optional representations
    pub fn from_parts(int: Option<i64>, double: Option<f64>) -> Self {
        match (int, double) {
            (None, None) => Value::Absent,
            (Some(int), None) => Value::Int(int),
            (None, Some(double)) => Value::Double(double),
            (Some(int), Some(double)) => Value::IntAndDouble { int, double },
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

/// Wire shape of [`Value`]: two optional fields
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Datum {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    int_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    double_value: Option<f64>,
}

impl From<Datum> for Value {
    fn from(d: Datum) -> Self {
        Value::from_parts(d.int_value, d.double_value)
    }
}

impl From<Value> for Datum {
    fn from(v: Value) -> Self {
        Datum {
            int_value: v.as_int(),
            double_value: v.as_double(),
        }
    }
}

/// A key/value tag attached to a data point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    pub key: String,
    pub value: String,
}

impl Dimension {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One timestamped measurement of a named metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    /// Metric name
    pub metric: String,

    /// Milliseconds since epoch
    #[serde(default)]
    pub timestamp: i64,

    /// Ordered dimensions; keys may repeat
    #[serde(default)]
    pub dimensions: Vec<Dimension>,

    /// Metric value
    #[serde(default)]
    pub value: Value,

    /// Metric kind, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<MetricType>,
}

impl DataPoint {
    /// Create a new data point with no dimensions and a zero timestamp
    pub fn new(metric: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            metric: metric.into(),
            timestamp: 0,
            dimensions: Vec::new(),
            value: value.into(),
            metric_type: None,
        }
    }

    /// Append a dimension
    pub fn with_dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.push(Dimension::new(key, value));
        self
    }

    /// Set timestamp
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the metric type
    pub fn with_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = Some(metric_type);
        self
    }

    /// Value of the first dimension with the given key
    pub fn dimension(&self, key: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.key == key)
            .map(|d| d.value.as_str())
    }
}
