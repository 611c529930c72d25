//! CLI command handlers

pub mod commands;

pub use commands::{add_field, aggregate, eval, remove_field, report, validate};
