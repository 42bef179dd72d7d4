//! Handlers for price inference.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use fleetcast_core::error::CoreError;
use fleetcast_core::features::{self, VehicleFeatures};
use fleetcast_core::pricing::PriceEstimate;
use fleetcast_core::types::ModelVersion;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Largest number of vehicles accepted in one request.
pub const MAX_BATCH_SIZE: usize = 1_000;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub input: Vec<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub model_version: ModelVersion,
    pub predictions: Vec<PriceEstimate>,
}

// ---------------------------------------------------------------------------
// POST /predict
// ---------------------------------------------------------------------------

/// Predict daily rental prices for a batch of vehicles.
///
/// Every item is validated before any prediction runs; the first invalid
/// item fails the whole request. All estimates come from one model snapshot.
pub async fn predict(
    State(state): State<AppState>,
    Json(body): Json<PredictRequest>,
) -> AppResult<impl IntoResponse> {
    if body.input.is_empty() {
        return Err(AppError::BadRequest("input must contain at least one vehicle".into()));
    }
    if body.input.len() > MAX_BATCH_SIZE {
        return Err(AppError::BadRequest(format!(
            "input holds {} vehicles, the limit is {MAX_BATCH_SIZE}",
            body.input.len()
        )));
    }

    let vehicles = body
        .input
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            features::validate(raw).map_err(|e| match e {
                CoreError::Validation(violation) => AppError::InvalidItem { index, violation },
                other => AppError::Core(other),
            })
        })
        .collect::<Result<Vec<VehicleFeatures>, _>>()?;

    let (model_version, predictions) = state
        .registry
        .predict_batch(&vehicles, &state.config.pricing)?;

    tracing::debug!(
        count = predictions.len(),
        %model_version,
        "Served price predictions",
    );

    Ok(Json(DataResponse {
        data: PredictResponse {
            model_version,
            predictions,
        },
    }))
}
