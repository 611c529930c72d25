//! Aggregation of formula results across a record collection

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::formula::{math, Formula, FormulaCache};
use crate::error::FormulaError;
use crate::types::{CalculatedField, Record};

/// How per-record results reduce to one number.
///
/// `Count` counts records, unlike the `COUNT()` formula function which
/// counts its arguments.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReductionKind {
    #[default]
    Sum,
    #[serde(alias = "avg")]
    #[value(alias = "avg")]
    Average,
    Min,
    Max,
    Count,
}

impl ReductionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReductionKind::Sum => "sum",
            ReductionKind::Average => "average",
            ReductionKind::Min => "min",
            ReductionKind::Max => "max",
            ReductionKind::Count => "count",
        }
    }

    /// Reduce per-record values. Empty input gives 0 for every kind.
    pub fn reduce(self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match self {
            ReductionKind::Sum => math::sum(values),
            ReductionKind::Average => math::mean(values),
            ReductionKind::Min => math::min(values),
            ReductionKind::Max => math::max(values),
            ReductionKind::Count => values.len() as f64,
        }
    }
}

impl fmt::Display for ReductionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReductionKind {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(ReductionKind::Sum),
            "average" | "avg" => Ok(ReductionKind::Average),
            "min" => Ok(ReductionKind::Min),
            "max" => Ok(ReductionKind::Max),
            "count" => Ok(ReductionKind::Count),
            other => Err(FormulaError::Parse(format!(
                "Unknown reduction kind: {}",
                other
            ))),
        }
    }
}

impl Formula {
    /// Evaluate against every record and reduce
    pub fn aggregate(&self, records: &[Record], kind: ReductionKind) -> f64 {
        kind.reduce(&self.evaluate_all(records))
    }
}

impl FormulaCache {
    /// Cached counterpart of [`aggregate_formula_over_records`]
    pub fn aggregate(&self, source: &str, records: &[Record], kind: ReductionKind) -> f64 {
        if records.is_empty() {
            return 0.0;
        }
        match self.get_or_compile(source) {
            Ok(formula) => formula.aggregate(records, kind),
            Err(e) => {
                debug!(formula = source, error = %e, "formula evaluation fell back to 0");
                kind.reduce(&vec![0.0; records.len()])
            }
        }
    }
}

/// Per-record formula results (a calculated-field column).
///
/// A formula that fails to compile yields one 0 per record.
pub fn evaluate_over_records(formula: &str, records: &[Record]) -> Vec<f64> {
    match Formula::compile(formula) {
        Ok(compiled) => compiled.evaluate_all(records),
        Err(e) => {
            debug!(formula, error = %e, "formula evaluation fell back to 0");
            vec![0.0; records.len()]
        }
    }
}

/// Evaluate a formula across records and reduce to a single statistic.
///
/// The formula is compiled once for the whole collection.
pub fn aggregate_formula_over_records(
    formula: &str,
    records: &[Record],
    kind: ReductionKind,
) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    kind.reduce(&evaluate_over_records(formula, records))
}

/// Evaluate each calculated field against one record, keyed by field id
pub fn evaluate_calculated_fields(
    record: &Record,
    fields: &[CalculatedField],
) -> BTreeMap<String, f64> {
    fields
        .iter()
        .map(|field| {
            let value = super::formula::evaluate_formula(&field.formula, record);
            (field.id.clone(), value)
        })
        .collect()
}
