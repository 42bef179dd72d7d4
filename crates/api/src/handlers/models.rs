//! Handlers for inspecting and reloading the published model.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use fleetcast_core::types::ModelVersion;
use fleetcast_store::StoreError;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ModelList {
    /// Versions present in the artifact store, ascending.
    pub versions: Vec<ModelVersion>,
    /// Version currently serving predictions.
    pub current: Option<ModelVersion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReloadRequest {
    /// Version to publish. Defaults to the newest stored version.
    pub version: Option<ModelVersion>,
}

/// GET /models
pub async fn list_models(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let versions = state.artifacts.list_versions().await?;
    Ok(Json(DataResponse {
        data: ModelList {
            versions,
            current: state.registry.current_version(),
        },
    }))
}

/// GET /models/current
pub async fn current_model(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let artifact = state.registry.current()?;
    Ok(Json(DataResponse {
        data: artifact.summary(),
    }))
}

/// POST /models/reload
///
/// Loads an artifact from the store and publishes it. Publishing a version
/// that is not newer than the current one is rejected with 409.
pub async fn reload_model(
    State(state): State<AppState>,
    Json(body): Json<ReloadRequest>,
) -> AppResult<impl IntoResponse> {
    let artifact = match body.version {
        Some(version) => state.artifacts.load(version).await?,
        None => state
            .artifacts
            .load_latest()
            .await?
            .ok_or_else(|| AppError::Store(StoreError::NotFound("stored model".into())))?,
    };

    let published = state.registry.publish(artifact)?;
    tracing::info!(
        version = %published.version,
        fingerprint = %published.fingerprint,
        "Published model artifact",
    );

    Ok(Json(DataResponse {
        data: published.summary(),
    }))
}
