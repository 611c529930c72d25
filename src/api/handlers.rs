//! API request handlers
//!
//! Handlers for all REST API endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::server::AppState;
use crate::core::{validate_formula, ReductionKind};
use crate::types::{CalculatedField, Record};

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

impl EndpointInfo {
    fn new(path: &str, method: &str, description: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
        }
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Dealflow API Server".to_string(),
        version: state.version.clone(),
        description: "Formula evaluation for calculated fields and report metrics".to_string(),
        endpoints: vec![
            EndpointInfo::new("/health", "GET", "Health check endpoint"),
            EndpointInfo::new("/version", "GET", "Get server version"),
            EndpointInfo::new("/api/v1/validate", "POST", "Validate formula syntax"),
            EndpointInfo::new(
                "/api/v1/evaluate",
                "POST",
                "Evaluate a formula against one record",
            ),
            EndpointInfo::new(
                "/api/v1/aggregate",
                "POST",
                "Reduce a formula across records",
            ),
            EndpointInfo::new(
                "/api/v1/calculated-fields",
                "POST",
                "Evaluate calculated fields for one record",
            ),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub cached_formulas: usize,
}

/// GET /health - Health check
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        cached_formulas: state.formulas.len(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: ["validate", "evaluate", "aggregate", "calculated-fields"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }))
}

/// Validate request
#[derive(Deserialize)]
pub struct ValidateRequest {
    pub formula: String,
}

/// Validate response
#[derive(Serialize)]
pub struct ValidateResponse {
    pub formula: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/v1/validate - Validate formula syntax before save
pub async fn validate(Json(req): Json<ValidateRequest>) -> impl IntoResponse {
    let validation = validate_formula(&req.formula);
    debug!(formula = %req.formula, valid = validation.valid, "validated formula");

    Json(ApiResponse::ok(ValidateResponse {
        formula: req.formula,
        valid: validation.valid,
        error: validation.error,
    }))
}

/// Evaluate request
#[derive(Deserialize)]
pub struct EvaluateRequest {
    pub formula: String,
    #[serde(default)]
    pub record: Record,
}

/// Evaluate response
#[derive(Serialize)]
pub struct EvaluateResponse {
    pub formula: String,
    pub value: f64,
}

/// POST /api/v1/evaluate - Evaluate a formula against one record
pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EvaluateRequest>,
) -> impl IntoResponse {
    let value = state.formulas.evaluate(&req.formula, &req.record);

    Json(ApiResponse::ok(EvaluateResponse {
        formula: req.formula,
        value,
    }))
}

/// Aggregate request
#[derive(Deserialize)]
pub struct AggregateRequest {
    pub formula: String,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub kind: ReductionKind,
}

/// Aggregate response
#[derive(Serialize)]
pub struct AggregateResponse {
    pub formula: String,
    pub kind: ReductionKind,
    pub record_count: usize,
    pub value: f64,
}

/// POST /api/v1/aggregate - Reduce a formula across records
pub async fn aggregate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AggregateRequest>,
) -> impl IntoResponse {
    let value = state.formulas.aggregate(&req.formula, &req.records, req.kind);

    Json(ApiResponse::ok(AggregateResponse {
        formula: req.formula,
        kind: req.kind,
        record_count: req.records.len(),
        value,
    }))
}

/// Calculated fields request
#[derive(Deserialize)]
pub struct CalculatedFieldsRequest {
    #[serde(default)]
    pub record: Record,
    pub fields: Vec<CalculatedField>,
}

/// Calculated fields response
#[derive(Serialize)]
pub struct CalculatedFieldsResponse {
    /// Field id -> value
    pub values: BTreeMap<String, f64>,
}

/// POST /api/v1/calculated-fields - Evaluate every field for one record
pub async fn calculated_fields(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CalculatedFieldsRequest>,
) -> impl IntoResponse {
    let values = req
        .fields
        .iter()
        .map(|field| {
            let value = state.formulas.evaluate(&field.formula, &req.record);
            (field.id.clone(), value)
        })
        .collect();

    Json(ApiResponse::ok(CalculatedFieldsResponse { values }))
}
