//! Dealflow API Server module
//!
//! HTTP REST API used by the reporting frontend to validate formulas before
//! save and to evaluate calculated fields and metrics server-side.
//! Run with `dealflow-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server};
