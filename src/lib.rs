//! Dealflow - formula engine for CRM reporting
//!
//! Report authors write small arithmetic formulas over deal fields
//! (`amount * probability / 100`, `IF(amount > 1000000, 1, 0)`). This crate
//! tokenizes and parses them into an expression tree, evaluates that tree
//! against a record, and reduces per-record results into report metrics.
//!
//! # Features
//!
//! - Tolerant parsing: malformed input degrades to 0 instead of failing
//! - Fixed function set: SUM, AVG, MIN, MAX, COUNT, IF, ABS, ROUND, FLOOR, CEIL
//! - Field synonyms `amount`, `probability` and derived `expectedValue`
//! - Aggregation (sum, average, min, max, count) across record collections
//! - Pre-save validation for empty input and unbalanced parentheses
//! - YAML report configurations, a CLI and an HTTP API
//!
//! # Example
//!
//! ```
//! use dealflow_formula::core::{aggregate_formula_over_records, ReductionKind};
//! use dealflow_formula::{evaluate_formula, Record};
//!
//! let deal = Record::new().with("amount", 1000.0).with("probability", 40.0);
//! assert_eq!(evaluate_formula("expectedValue", &deal), 400.0);
//!
//! let pipeline = vec![deal.clone(), deal];
//! let total = aggregate_formula_over_records("expected_value", &pipeline, ReductionKind::Sum);
//! assert_eq!(total, 800.0);
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod records;
pub mod report;
pub mod types;

// Re-export commonly used types
pub use crate::core::{evaluate_formula, validate_formula, Formula, FormulaCache, ReductionKind};
pub use error::{FormulaError, FormulaResult};
pub use types::{CalculatedField, FieldValue, Metric, Record};
