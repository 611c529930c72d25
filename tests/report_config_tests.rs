//! Report configuration persistence tests

use dealflow_formula::core::ReductionKind;
use dealflow_formula::records::load_records;
use dealflow_formula::report::ReportConfig;
use dealflow_formula::{evaluate_formula, CalculatedField, FormulaError, Metric, Record};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn deal(amount: f64, probability: f64) -> Record {
    Record::new()
        .with("amount", amount)
        .with("probability", probability)
}

#[test]
fn test_calculated_field_survives_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipeline.yaml");
    let record = deal(750_000.0, 35.0);

    let field = CalculatedField::new(
        "cf_weighted",
        "Weighted Amount",
        "ROUND(amount * probability / 100) + IF(amount > 500000, 1, 0)",
    );
    let before = evaluate_formula(&field.formula, &record);

    let mut config = ReportConfig::new("Pipeline");
    config.add_calculated_field(field.clone()).unwrap();
    config.save(&path).unwrap();

    let reloaded = ReportConfig::load(&path).unwrap();
    assert_eq!(reloaded, config);

    let stored = reloaded.calculated_field("cf_weighted").unwrap();
    assert_eq!(stored, &field);
    assert_eq!(evaluate_formula(&stored.formula, &record), before);
    assert_eq!(before, 262_501.0);
}

#[test]
fn test_formula_with_special_characters_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("odd.yaml");

    let mut config = ReportConfig::new("Odd");
    config
        .add_calculated_field(CalculatedField::new(
            "cf_odd",
            "Odd: quoting # test",
            "=amount: 'x' # comment?",
        ))
        .unwrap();
    config.save(&path).unwrap();

    let reloaded = ReportConfig::load(&path).unwrap();
    assert_eq!(
        reloaded.calculated_field("cf_odd").unwrap().formula,
        "=amount: 'x' # comment?"
    );
}

#[test]
fn test_invalid_field_is_never_persisted() {
    let mut config = ReportConfig::new("Pipeline");
    let err = config
        .add_calculated_field(CalculatedField::new("cf_bad", "Bad", "(amount * 2"))
        .unwrap_err();

    assert!(matches!(err, FormulaError::Validation(_)));
    assert!(err.to_string().contains("Unbalanced parentheses"));
    assert!(config.calculated_fields.is_empty());
}

#[test]
fn test_duplicate_and_unknown_field_ids() {
    let mut config = ReportConfig::new("Pipeline");
    config
        .add_calculated_field(CalculatedField::new("cf_a", "A", "amount"))
        .unwrap();

    let dup = config.add_calculated_field(CalculatedField::new("cf_a", "A again", "1"));
    assert!(matches!(dup, Err(FormulaError::DuplicateField(id)) if id == "cf_a"));

    let missing = config.remove_calculated_field("cf_zzz");
    assert!(matches!(missing, Err(FormulaError::UnknownField(id)) if id == "cf_zzz"));

    let removed = config.remove_calculated_field("cf_a").unwrap();
    assert_eq!(removed.name, "A");
    assert!(config.calculated_fields.is_empty());
}

#[test]
fn test_report_run_over_record_file() {
    let dir = TempDir::new().unwrap();
    let records_path = dir.path().join("deals.json");
    fs::write(
        &records_path,
        r#"[
            {"amount": 1000, "probability": 50, "stage": "Proposal"},
            {"amount": 3000, "probability": 10, "stage": "Discovery"},
            {"amount": 2000, "probability": 100, "stage": "Closed Won"}
        ]"#,
    )
    .unwrap();
    let records = load_records(&records_path).unwrap();

    let config = ReportConfig::from_yaml_str(
        r#"
name: Quarterly Pipeline
calculated_fields:
  - id: cf_ev
    name: Expected Value
    formula: expectedValue
metrics:
  - id: m_total
    name: Weighted Pipeline
    formula: expected_value
  - id: m_avg
    name: Average Deal
    formula: amount
    kind: avg
  - id: m_deals
    name: Deals
    formula: "0"
    kind: count
"#,
    )
    .unwrap();

    let output = config.run(&records);
    assert_eq!(output.report, "Quarterly Pipeline");
    assert_eq!(output.record_count, 3);
    let evs: Vec<f64> = output.rows.iter().map(|row| row["cf_ev"]).collect();
    assert_eq!(evs, vec![500.0, 300.0, 2000.0]);
    assert_eq!(output.metrics["m_total"], 2800.0);
    assert_eq!(output.metrics["m_avg"], 2000.0);
    assert_eq!(output.metrics["m_deals"], 3.0);
}

#[test]
fn test_metric_kind_defaults_to_sum() {
    let config = ReportConfig::from_yaml_str(
        "name: R\nmetrics:\n  - id: m\n    name: M\n    formula: amount\n",
    )
    .unwrap();
    assert_eq!(config.metrics[0].kind, ReductionKind::Sum);

    let mut config = config;
    let bad = config.add_metric(Metric {
        id: "m_bad".to_string(),
        name: "Bad".to_string(),
        formula: String::new(),
        kind: ReductionKind::Max,
    });
    assert!(bad.is_err());
    assert_eq!(config.metrics.len(), 1);
}
