//! Core formula engine: evaluation, validation and aggregation

pub mod aggregate;
pub mod formula;
pub mod validation;

pub use aggregate::{
    aggregate_formula_over_records, evaluate_calculated_fields, evaluate_over_records,
    ReductionKind,
};
pub use formula::{evaluate_formula, try_evaluate, Formula, FormulaCache};
pub use validation::{validate_formula, Validation};
