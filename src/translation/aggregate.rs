//! Dimension-subset aggregation
//!
//! Groups data points of one metric by the values of a configured, ordered
//! list of dimension keys and reduces every group to a single data point.

use std::collections::HashMap;

use super::datapoint::{DataPoint, Dimension, MetricType, Value};
use super::rules::AggregationMethod;

/// Separator appended after each dimension value in an aggregation key
const AGGREGATION_KEY_DELIMITER: &str = "//";

/// Build the composite aggregation key of a data point
///
/// The key concatenates, in `keys` order, the value of every dimension
/// carrying each key. A key repeated on the data point contributes all of
/// its values, in dimension order.
///
/// # Errors
///
/// Returns the first configured key the data point does not carry.
pub fn aggregation_key<'k>(dimensions: &[Dimension], keys: &'k [String]) -> Result<String, &'k str> {
    let mut aggregation_key = String::new();
    for key in keys {
        let mut found = false;
        for dimension in dimensions.iter().filter(|d| &d.key == key) {
            aggregation_key.push_str(&dimension.value);
            aggregation_key.push_str(AGGREGATION_KEY_DELIMITER);
            found = true;
        }
        if !found {
            return Err(key.as_str());
        }
    }
    Ok(aggregation_key)
}

/// Aggregate data points by a dimension subset
///
/// Data points missing any of `keys` are dropped. Each remaining group
/// produces one data point cloned from its first member, with dimensions
/// restricted to `keys` in configured order (every occurrence of a
/// repeated key is kept). Groups are emitted in order of
/// first appearance.
pub fn aggregate_data_points(
    data_points: Vec<DataPoint>,
    keys: &[String],
    method: AggregationMethod,
) -> Vec<DataPoint> {
    if data_points.is_empty() {
        return Vec::new();
    }

    let mut group_index: HashMap<String, usize> = HashMap::with_capacity(data_points.len());
    let mut groups: Vec<Vec<DataPoint>> = Vec::new();

    for dp in data_points {
        let key = match aggregation_key(&dp.dimensions, keys) {
            Ok(key) => key,
            Err(missing) => {
                tracing::debug!(
                    metric = %dp.metric,
                    dimension = %missing,
                    "Data point dropped: dimension to aggregate by is not found"
                );
                continue;
            }
        };

        match group_index.get(&key) {
            Some(&i) => groups[i].push(dp),
            None => {
                group_index.insert(key, groups.len());
                groups.push(vec![dp]);
            }
        }
    }

    groups
        .into_iter()
        .filter_map(|group| reduce_group(group, keys, method))
        .collect()
}

/// Reduce one non-empty group to a single data point
fn reduce_group(
    group: Vec<DataPoint>,
    keys: &[String],
    method: AggregationMethod,
) -> Option<DataPoint> {
    let value = match method {
        AggregationMethod::Count => Value::Int(group.len() as i64),
        AggregationMethod::Sum => sum_values(&group),
    };

    let mut result = group.into_iter().next()?;
    result.dimensions = filter_dimensions(&result.dimensions, keys);
    result.value = value;
    if method == AggregationMethod::Count {
        result.metric_type = Some(MetricType::Gauge);
    }

    Some(result)
}

/// Sum integer and floating-point contributions independently
fn sum_values(group: &[DataPoint]) -> Value {
    let mut int_sum: Option<i64> = None;
    let mut double_sum: Option<f64> = None;

    for dp in group {
        if let Some(v) = dp.value.as_int() {
            int_sum = Some(int_sum.unwrap_or(0).wrapping_add(v));
        }
        if let Some(v) = dp.value.as_double() {
            double_sum = Some(double_sum.unwrap_or(0.0) + v);
        }
    }

    Value::from_parts(int_sum, double_sum)
}

/// Keep the dimensions carrying one of `keys`, grouped in `keys` order
fn filter_dimensions(dimensions: &[Dimension], keys: &[String]) -> Vec<Dimension> {
    keys.iter()
        .flat_map(|key| dimensions.iter().filter(move |d| &d.key == key))
        .cloned()
        .collect()
}
