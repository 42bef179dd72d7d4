use axum::extract::State;
use axum::{routing::get, Json, Router};
use fleetcast_core::types::ModelVersion;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when a model is published, `degraded` otherwise.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub model_loaded: bool,
    pub model_version: Option<ModelVersion>,
}

/// GET /health -- returns service and model health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_version = state.registry.current_version();
    let model_loaded = model_version.is_some();

    Json(HealthResponse {
        status: if model_loaded { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        model_loaded,
        model_version,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
