//! Formula evaluator
//!
//! Evaluates an expression tree against a single record. Evaluation is total:
//! unknown fields, missing arguments and division by zero all resolve to 0.

use super::fields::resolve_field;
use super::math;
use super::parser::{BinaryOp, Expr};
use super::tokenizer::Function;
use crate::types::Record;

/// Tolerance for `=` and `<>`
const EQUALITY_EPSILON: f64 = 1e-10;

/// Evaluate an expression against a record
pub fn evaluate(expr: &Expr, record: &Record) -> f64 {
    match expr {
        Expr::Literal(n) => *n,

        Expr::Field(name) => resolve_field(record, name),

        Expr::Call { function, args } => {
            // Arguments are evaluated eagerly, left to right
            let values: Vec<f64> = args.iter().map(|arg| evaluate(arg, record)).collect();
            apply_function(*function, &values)
        }

        Expr::Binary { op, left, right } => {
            let l = evaluate(left, record);
            let r = evaluate(right, record);
            apply_binary(*op, l, r)
        }
    }
}

fn apply_binary(op: BinaryOp, l: f64, r: f64) -> f64 {
    match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => math::safe_div(l, r),
        BinaryOp::Rem => math::safe_rem(l, r),
        BinaryOp::Gt => flag(l > r),
        BinaryOp::Lt => flag(l < r),
        BinaryOp::Ge => flag(l >= r),
        BinaryOp::Le => flag(l <= r),
        BinaryOp::Eq => flag((l - r).abs() < EQUALITY_EPSILON),
        BinaryOp::Ne => flag((l - r).abs() >= EQUALITY_EPSILON),
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Apply a built-in function to already-evaluated arguments
pub fn apply_function(function: Function, args: &[f64]) -> f64 {
    let arg = |i: usize| args.get(i).copied().unwrap_or(0.0);

    match function {
        Function::Sum => math::sum(args),
        Function::Avg => math::mean(args),
        Function::Min => math::min(args),
        Function::Max => math::max(args),
        Function::Count => args.len() as f64,
        Function::If => {
            if math::is_truthy(arg(0)) {
                arg(1)
            } else {
                arg(2)
            }
        }
        Function::Abs => arg(0).abs(),
        Function::Round => math::round_half_up(arg(0)),
        Function::Floor => arg(0).floor(),
        Function::Ceil => arg(0).ceil(),
    }
}
