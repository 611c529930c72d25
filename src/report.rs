//! Report configuration: calculated fields and custom metrics
//!
//! A report configuration owns its calculated fields exclusively. Fields are
//! validated before they are added, and the whole configuration is persisted
//! as YAML with formulas stored as plain strings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::core::aggregate::{aggregate_formula_over_records, evaluate_calculated_fields};
use crate::core::validation::validate_formula;
use crate::error::{FormulaError, FormulaResult};
use crate::types::{CalculatedField, Metric, Record};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub name: String,
    #[serde(default)]
    pub calculated_fields: Vec<CalculatedField>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

/// Result of running a report over a record collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOutput {
    pub report: String,
    pub record_count: usize,
    /// One row per record: calculated field id -> value
    pub rows: Vec<BTreeMap<String, f64>>,
    /// Metric id -> reduced value
    pub metrics: BTreeMap<String, f64>,
}

impl ReportConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_yaml_str(content: &str) -> FormulaResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml_string(&self) -> FormulaResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn load(path: &Path) -> FormulaResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn save(&self, path: &Path) -> FormulaResult<()> {
        fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }

    pub fn calculated_field(&self, id: &str) -> Option<&CalculatedField> {
        self.calculated_fields.iter().find(|f| f.id == id)
    }

    /// Add a calculated field. Invalid formulas and duplicate ids are
    /// rejected and leave the configuration unchanged.
    pub fn add_calculated_field(&mut self, field: CalculatedField) -> FormulaResult<()> {
        let validation = validate_formula(&field.formula);
        if !validation.is_valid() {
            return Err(FormulaError::Validation(format!(
                "Calculated field '{}': {}",
                field.name,
                validation.error.unwrap_or_default()
            )));
        }
        if self.calculated_field(&field.id).is_some() {
            return Err(FormulaError::DuplicateField(field.id));
        }

        self.calculated_fields.push(field);
        Ok(())
    }

    /// Remove a calculated field by id, returning it
    pub fn remove_calculated_field(&mut self, id: &str) -> FormulaResult<CalculatedField> {
        let index = self
            .calculated_fields
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| FormulaError::UnknownField(id.to_string()))?;
        Ok(self.calculated_fields.remove(index))
    }

    /// Add a metric, validating its formula first
    pub fn add_metric(&mut self, metric: Metric) -> FormulaResult<()> {
        let validation = validate_formula(&metric.formula);
        if !validation.is_valid() {
            return Err(FormulaError::Validation(format!(
                "Metric '{}': {}",
                metric.name,
                validation.error.unwrap_or_default()
            )));
        }
        self.metrics.push(metric);
        Ok(())
    }

    /// Evaluate calculated fields per record and metrics across all records
    pub fn run(&self, records: &[Record]) -> ReportOutput {
        let rows = records
            .iter()
            .map(|record| evaluate_calculated_fields(record, &self.calculated_fields))
            .collect();

        let metrics = self
            .metrics
            .iter()
            .map(|m| {
                let value = aggregate_formula_over_records(&m.formula, records, m.kind);
                (m.id.clone(), value)
            })
            .collect();

        ReportOutput {
            report: self.name.clone(),
            record_count: records.len(),
            rows,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::ReductionKind;

    fn pipeline_report() -> ReportConfig {
        let mut config = ReportConfig::new("Q3 Pipeline");
        config
            .add_calculated_field(CalculatedField::new(
                "weighted",
                "Weighted Amount",
                "amount * probability / 100",
            ))
            .unwrap();
        config
            .add_metric(Metric {
                id: "total_weighted".to_string(),
                name: "Total Weighted".to_string(),
                formula: "expected_value".to_string(),
                kind: ReductionKind::Sum,
            })
            .unwrap();
        config
    }

    #[test]
    fn test_invalid_formula_blocks_add() {
        let mut config = pipeline_report();
        let before = config.clone();

        let err = config
            .add_calculated_field(CalculatedField::new("bad", "Bad", "(amount * 2"))
            .unwrap_err();
        assert!(err.to_string().contains("Unbalanced parentheses"));
        assert_eq!(config, before);

        assert!(config
            .add_calculated_field(CalculatedField::new("empty", "Empty", "  "))
            .is_err());
        assert_eq!(config, before);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut config = pipeline_report();
        let err = config
            .add_calculated_field(CalculatedField::new("weighted", "Again", "amount"))
            .unwrap_err();
        assert!(matches!(err, FormulaError::DuplicateField(id) if id == "weighted"));
        assert_eq!(config.calculated_fields.len(), 1);
    }

    #[test]
    fn test_remove_calculated_field() {
        let mut config = pipeline_report();
        let removed = config.remove_calculated_field("weighted").unwrap();
        assert_eq!(removed.name, "Weighted Amount");
        assert!(config.calculated_fields.is_empty());
        assert!(matches!(
            config.remove_calculated_field("weighted"),
            Err(FormulaError::UnknownField(_))
        ));
    }

    #[test]
    fn test_invalid_metric_rejected() {
        let mut config = pipeline_report();
        assert!(config
            .add_metric(Metric {
                id: "m".to_string(),
                name: "Broken".to_string(),
                formula: "SUM(amount))".to_string(),
                kind: ReductionKind::Max,
            })
            .is_err());
        assert_eq!(config.metrics.len(), 1);
    }

    #[test]
    fn test_run() {
        let records = vec![
            Record::new().with("amount", 1000.0).with("probability", 20.0),
            Record::new().with("amount", 3000.0).with("probability", 50.0),
        ];
        let output = pipeline_report().run(&records);

        assert_eq!(output.report, "Q3 Pipeline");
        assert_eq!(output.record_count, 2);
        assert_eq!(output.rows[0]["weighted"], 200.0);
        assert_eq!(output.rows[1]["weighted"], 1500.0);
        assert_eq!(output.metrics["total_weighted"], 1700.0);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = pipeline_report();
        let yaml = config.to_yaml_string().unwrap();
        assert!(yaml.contains("amount * probability / 100"));
        assert_eq!(ReportConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let config = ReportConfig::from_yaml_str("name: Bare\n").unwrap();
        assert!(config.calculated_fields.is_empty());
        assert!(config.metrics.is_empty());
    }
}
