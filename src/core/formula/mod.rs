//! Formula engine: tokenizer, parser, evaluator and field resolution
//!
//! A formula is compiled once into an expression tree and can then be
//! evaluated against any number of records.
//!
//! ```
//! use dealflow_formula::core::formula::evaluate_formula;
//! use dealflow_formula::types::Record;
//!
//! let deal = Record::new().with("amount", 1_000_000.0).with("probability", 50.0);
//! assert_eq!(evaluate_formula("amount * probability / 100", &deal), 500_000.0);
//! ```

pub mod evaluator;
pub mod fields;
pub(crate) mod math;
pub mod parser;
pub mod tokenizer;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::FormulaResult;
use crate::types::Record;

pub use parser::{BinaryOp, Expr};
pub use tokenizer::{Function, Operator, Token};

/// A compiled formula
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Tokenize and parse a formula string
    pub fn compile(source: &str) -> FormulaResult<Self> {
        let tokens = tokenizer::tokenize(source);
        let expr = parser::parse(&tokens)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate against one record
    pub fn evaluate(&self, record: &Record) -> f64 {
        evaluator::evaluate(&self.expr, record)
    }

    /// Evaluate against each record, in order
    pub fn evaluate_all(&self, records: &[Record]) -> Vec<f64> {
        records.iter().map(|r| self.evaluate(r)).collect()
    }
}

/// Compile and evaluate, surfacing compile errors
pub fn try_evaluate(formula: &str, record: &Record) -> FormulaResult<f64> {
    Ok(Formula::compile(formula)?.evaluate(record))
}

/// Compile and evaluate. Never fails: any error evaluates to 0.
pub fn evaluate_formula(formula: &str, record: &Record) -> f64 {
    try_evaluate(formula, record).unwrap_or_else(|e| {
        debug!(formula, error = %e, "formula evaluation fell back to 0");
        0.0
    })
}

/// Default number of compiled formulas a [`FormulaCache`] holds
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Compiled formulas keyed by source string.
///
/// Shared across requests; compilation happens once per distinct formula.
/// When full, the cache is emptied before the next formula is stored, so
/// it never holds more than its capacity.
#[derive(Debug)]
pub struct FormulaCache {
    compiled: RwLock<HashMap<String, Arc<Formula>>>,
    capacity: usize,
}

impl Default for FormulaCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl FormulaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` formulas (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            compiled: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fetch a compiled formula, compiling and storing it on first use
    pub fn get_or_compile(&self, source: &str) -> FormulaResult<Arc<Formula>> {
        if let Some(formula) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source)
        {
            return Ok(Arc::clone(formula));
        }

        let formula = Arc::new(Formula::compile(source)?);
        let mut compiled = self
            .compiled
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if compiled.len() >= self.capacity && !compiled.contains_key(source) {
            debug!(capacity = self.capacity, "formula cache full, clearing");
            compiled.clear();
        }
        compiled
            .entry(source.to_string())
            .or_insert_with(|| Arc::clone(&formula));
        Ok(formula)
    }

    /// Cached counterpart of [`evaluate_formula`]
    pub fn evaluate(&self, source: &str, record: &Record) -> f64 {
        match self.get_or_compile(source) {
            Ok(formula) => formula.evaluate(record),
            Err(e) => {
                debug!(formula = source, error = %e, "formula evaluation fell back to 0");
                0.0
            }
        }
    }

    pub fn len(&self) -> usize {
        self.compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.compiled
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
