//! Numeric helpers: saturating division, rounding, reductions
//!
//! Every helper is total. Division by zero and empty inputs give `0`.

/// `left / right`, or 0 when `right` is zero
pub(crate) fn safe_div(left: f64, right: f64) -> f64 {
    if right == 0.0 {
        0.0
    } else {
        left / right
    }
}

/// Truncated remainder (sign follows the dividend), or 0 when `right` is zero
pub(crate) fn safe_rem(left: f64, right: f64) -> f64 {
    if right == 0.0 {
        0.0
    } else {
        left % right
    }
}

/// ROUND: nearest integer, halves toward positive infinity (2.5 -> 3, -2.5 -> -2)
pub(crate) fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Non-zero and not NaN
pub(crate) fn is_truthy(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

pub(crate) fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    sum(values) / values.len() as f64
}

pub(crate) fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

pub(crate) fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}
