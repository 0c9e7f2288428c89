//! Translator integration tests
//!
//! Exercises the public library API end to end: rules loaded from a YAML
//! configuration, batches decoded from JSON, translated and rendered.

use metric_translator::batch::{parse_batch, render_batch, BatchFormat};
use metric_translator::cli::OutputFormat;
use metric_translator::config::{Config, ConfigError};
use metric_translator::error::RuleError;
use metric_translator::translation::{DataPoint, MetricTranslator, MetricType, Value};

fn translator_from_yaml(yaml: &str) -> MetricTranslator {
    Config::from_yaml(yaml)
        .expect("valid config")
        .translator()
        .expect("valid rules")
}

fn find<'a>(batch: &'a [DataPoint], metric: &str) -> Vec<&'a DataPoint> {
    batch.iter().filter(|dp| dp.metric == metric).collect()
}

// ========================================================================
// Construction
// ========================================================================

#[test]
fn test_invalid_rule_lists_fail_construction() {
    let result = Config::from_yaml(
        r#"
translation_rules:
  - action: rename_dimension_keys
    mapping: {a: b}
  - action: rename_metrics
    mapping: {x: y}
  - action: rename_dimension_keys
    mapping: {c: d}
"#,
    );
    match result {
        Err(ConfigError::Rule(err @ RuleError::DuplicateRule { .. })) => {
            assert_eq!(err.index(), 2)
        }
        other => panic!("expected duplicate rule error, got {:?}", other),
    }

    let result = Config::from_yaml(
        r#"
translation_rules:
  - action: calculate_new_metric
    metric_name: ratio
    operand1_metric: a
    operand2_metric: b
    operator: "*"
"#,
    );
    assert!(matches!(
        result,
        Err(ConfigError::Rule(RuleError::InvalidOperator { .. }))
    ));
}

// ========================================================================
// End to end
// ========================================================================

#[test]
fn test_rename_then_scale() {
    let translator = translator_from_yaml(
        r#"
translation_rules:
  - action: rename_metrics
    mapping:
      cpu.pct: cpu.usage
  - action: multiply_float
    scale_factors_float:
      cpu.usage: 100.0
"#,
    );

    let batch = parse_batch(
        r#"[{"metric": "cpu.pct", "value": {"doubleValue": 0.42}}]"#,
        BatchFormat::Json,
    )
    .unwrap();
    let out = translator.translate_data_points(batch);

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].metric, "cpu.usage");
    let v = out[0].value.as_double().unwrap();
    assert!((v - 42.0).abs() < 1e-9);
}

#[test]
fn test_kubernetes_style_pipeline() {
    let translator = translator_from_yaml(
        r#"
translation_rules:
  - action: rename_dimension_keys
    mapping:
      k8s.node.name: kubernetes_node
      k8s.namespace.name: kubernetes_namespace
  - action: copy_metrics
    mapping:
      container.cpu.time: cpu.time.copy
    dimension_key: kubernetes_namespace
    dimension_values:
      - prod
  - action: aggregate_metric
    metric_name: cpu.time.copy
    aggregation_method: sum
    dimensions:
      - kubernetes_node
  - action: rename_metrics
    mapping:
      cpu.time.copy: node.cpu.time
"#,
    );

    let batch = vec![
        DataPoint::new("container.cpu.time", 5i64)
            .with_dimension("k8s.node.name", "n1")
            .with_dimension("k8s.namespace.name", "prod"),
        DataPoint::new("container.cpu.time", 3i64)
            .with_dimension("k8s.node.name", "n1")
            .with_dimension("k8s.namespace.name", "prod"),
        DataPoint::new("container.cpu.time", 100i64)
            .with_dimension("k8s.node.name", "n1")
            .with_dimension("k8s.namespace.name", "dev"),
        DataPoint::new("container.cpu.time", 4i64)
            .with_dimension("k8s.node.name", "n2")
            .with_dimension("k8s.namespace.name", "prod"),
    ];

    let out = translator.translate_data_points(batch);

    assert_eq!(find(&out, "container.cpu.time").len(), 4);
    let nodes = find(&out, "node.cpu.time");
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].dimension("kubernetes_node"), Some("n1"));
    assert_eq!(nodes[0].value, Value::Int(8));
    assert_eq!(nodes[0].dimensions.len(), 1);
    assert_eq!(nodes[1].dimension("kubernetes_node"), Some("n2"));
    assert_eq!(nodes[1].value, Value::Int(4));

    assert_eq!(translator.translate_dimension("k8s.node.name"), "kubernetes_node");
    assert_eq!(translator.translate_dimension("other"), "other");
}

#[test]
fn test_split_convert_and_derive() {
    let translator = translator_from_yaml(
        r#"
translation_rules:
  - action: split_metric
    metric_name: disk.ops
    dimension_key: direction
    mapping:
      read: disk.ops.read
      write: disk.ops.write
  - action: calculate_new_metric
    metric_name: disk.read.ratio
    operand1_metric: disk.ops.read
    operand2_metric: disk.ops.write
    operator: /
  - action: convert_values
    types_mapping:
      disk.ops.read: double
"#,
    );

    let batch = vec![
        DataPoint::new("disk.ops", 10i64)
            .with_dimension("direction", "read")
            .with_dimension("device", "sda")
            .with_type(MetricType::Counter),
        DataPoint::new("disk.ops", 4i64)
            .with_dimension("direction", "write")
            .with_dimension("device", "sda"),
    ];

    let out = translator.translate_data_points(batch);
    assert_eq!(out.len(), 3);

    let read = find(&out, "disk.ops.read")[0];
    assert_eq!(read.value, Value::Double(10.0));
    assert_eq!(read.dimension("direction"), None);
    assert_eq!(read.dimension("device"), Some("sda"));

    let ratio = find(&out, "disk.read.ratio")[0];
    assert_eq!(ratio.value, Value::Double(2.5));
    assert_eq!(ratio.dimension("device"), Some("sda"));
    assert_eq!(ratio.metric_type, Some(MetricType::Counter));
}

#[test]
fn test_count_aggregation_renders() {
    let translator = translator_from_yaml(
        r#"
translation_rules:
  - action: aggregate_metric
    metric_name: pod.up
    aggregation_method: count
    dimensions: [node]
"#,
    );

    let batch: Vec<DataPoint> = (0..3)
        .map(|i| {
            DataPoint::new("pod.up", 1i64)
                .with_dimension("node", "n1")
                .with_dimension("pod", format!("p{}", i))
        })
        .collect();

    let out = translator.translate_data_points(batch);
    let text = render_batch(&out, OutputFormat::Text).unwrap();
    assert_eq!(text, "pod.up{node=\"n1\"} 3 0 # gauge\n");
}

#[test]
fn test_empty_translator_passes_batch_through() {
    let translator = Config::default().translator().unwrap();
    let batch = vec![
        DataPoint::new("a", 1i64).with_dimension("k", "v"),
        DataPoint::new("b", 2.5),
    ];
    assert_eq!(translator.translate_data_points(batch.clone()), batch);
}
