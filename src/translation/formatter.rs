//! Human-readable batch output
//!
//! Renders a batch of data points one line per point, in batch order:
//!
//! ```text
//! <metric>{<key1>="<value1>",<key2>="<value2>"} <value> [<timestamp>] [# <type>]
//! ```
//!
//! Dimensions keep their order in the data point. Integer values are
//! printed as integers, floating-point values as decimals. A value holding
//! both representations prints `<int>,<double>`; an absent value prints `-`.

use super::datapoint::{DataPoint, Value};

/// Text formatter for data point batches
///
/// # Example
///
/// ```ignore
/// use metric_translator::translation::{DataPoint, TextFormatter};
///
/// let batch = vec![DataPoint::new("cpu.usage", 42.0).with_dimension("host", "h1")];
/// let output = TextFormatter::new().format(&batch);
/// assert_eq!(output, "cpu.usage{host=\"h1\"} 42\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    /// Include timestamp in output
    include_timestamp: bool,
}

impl TextFormatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to include timestamps in output
    pub fn with_timestamps(mut self, include: bool) -> Self {
        self.include_timestamp = include;
        self
    }

    /// Format a batch, one line per data point
    pub fn format(&self, data_points: &[DataPoint]) -> String {
        let mut output = String::with_capacity(data_points.len() * 64);
        for dp in data_points {
            output.push_str(&self.format_line(dp));
            output.push('\n');
        }
        output
    }

    fn format_line(&self, dp: &DataPoint) -> String {
        let mut line = dp.metric.clone();

        if !dp.dimensions.is_empty() {
            let pairs: Vec<String> = dp
                .dimensions
                .iter()
                .map(|d| format!("{}=\"{}\"", d.key, Self::escape_dimension_value(&d.value)))
                .collect();
            line.push('{');
            line.push_str(&pairs.join(","));
            line.push('}');
        }

        line.push(' ');
        line.push_str(&Self::format_value(&dp.value));

        if self.include_timestamp {
            line.push(' ');
            line.push_str(&dp.timestamp.to_string());
        }

        if let Some(metric_type) = dp.metric_type {
            line.push_str(" # ");
            line.push_str(metric_type.as_str());
        }

        line
    }

    fn format_value(value: &Value) -> String {
        match *value {
            Value::Absent => "-".to_string(),
            Value::Int(v) => v.to_string(),
            Value::Double(v) => Self::format_double(v),
            Value::IntAndDouble { int, double } => {
                format!("{},{}", int, Self::format_double(double))
            }
        }
    }

    /// Format a floating-point value
    ///
    /// - NaN → "NaN"
    /// - +Inf → "+Inf"
    /// - -Inf → "-Inf"
    /// - Whole numbers are formatted without decimal point
    /// - Large/small values use scientific notation
    fn format_double(value: f64) -> String {
        if value.is_nan() {
            "NaN".to_string()
        } else if value.is_infinite() {
            if value.is_sign_positive() {
                "+Inf".to_string()
            } else {
                "-Inf".to_string()
            }
        } else if value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else if value.abs() >= 1e6 || (value.abs() < 1e-3 && value != 0.0) {
            format!("{:e}", value)
        } else {
            format!("{}", value)
        }
    }

    /// Escapes backslash, double-quote, and newline characters.
    fn escape_dimension_value(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\\' => escaped.push_str("\\\\"),
                '"' => escaped.push_str("\\\""),
                '\n' => escaped.push_str("\\n"),
                _ => escaped.push(c),
            }
        }
        escaped
    }
}
