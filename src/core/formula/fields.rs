//! Field resolution: identifier -> number from a record
//!
//! A handful of deal fields have fixed, case-insensitive synonyms. Anything
//! else is an exact-key lookup. Missing and non-numeric fields read as 0.

use crate::types::Record;

/// Record key holding the deal amount
pub const AMOUNT_FIELD: &str = "amount";

/// Record key holding the win probability (0-100)
pub const PROBABILITY_FIELD: &str = "probability";

/// Resolve an identifier against a record
pub fn resolve_field(record: &Record, name: &str) -> f64 {
    match name.to_ascii_lowercase().as_str() {
        "amount" => amount(record),
        "probability" => probability(record),
        // Derived on every read, never stored
        "expectedvalue" | "expected_value" => amount(record) * probability(record) / 100.0,
        _ => record.number(name).unwrap_or(0.0),
    }
}

fn amount(record: &Record) -> f64 {
    record.number(AMOUNT_FIELD).unwrap_or(0.0)
}

fn probability(record: &Record) -> f64 {
    record.number(PROBABILITY_FIELD).unwrap_or(0.0)
}
