//! Handlers for delay-threshold analysis.
//!
//! Records come either inline (`records`) or from a named dataset
//! (`dataset`); exactly one must be given.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use fleetcast_core::delay::{
    self, CheckinScope, DelayFilter, DelayRecord, HistogramBin, ThresholdImpact,
};
use fleetcast_core::threshold::{self, CostConfig, ThresholdSearch};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Histogram bucket width used when the request does not set one.
pub const DEFAULT_BIN_WIDTH_MINUTES: u32 = 15;

fn default_true() -> bool {
    true
}

fn default_bin_width() -> u32 {
    DEFAULT_BIN_WIDTH_MINUTES
}

#[derive(Debug, Deserialize)]
pub struct ThresholdRequest {
    pub dataset: Option<String>,
    pub records: Option<Vec<DelayRecord>>,
    pub cost: CostConfig,
    #[serde(default)]
    pub search: ThresholdSearch,
    #[serde(default)]
    pub scope: CheckinScope,
    #[serde(default = "default_true")]
    pub ended_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct ImpactRequest {
    pub dataset: Option<String>,
    pub records: Option<Vec<DelayRecord>>,
    pub threshold_minutes: u32,
    #[serde(default)]
    pub scope: CheckinScope,
    #[serde(default = "default_true")]
    pub ended_only: bool,
    #[serde(default = "default_bin_width")]
    pub bin_width_minutes: u32,
}

#[derive(Debug, Serialize)]
pub struct ImpactResponse {
    #[serde(flatten)]
    pub impact: ThresholdImpact,
    pub histogram: Vec<HistogramBin>,
}

async fn resolve_records(
    state: &AppState,
    dataset: Option<String>,
    records: Option<Vec<DelayRecord>>,
) -> AppResult<Vec<DelayRecord>> {
    match (dataset, records) {
        (Some(name), None) => Ok(state.datasets.load_delays(&name).await?),
        (None, Some(records)) => Ok(records),
        (Some(_), Some(_)) => Err(AppError::BadRequest(
            "provide either 'dataset' or 'records', not both".into(),
        )),
        (None, None) => Err(AppError::BadRequest(
            "one of 'dataset' or 'records' is required".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// POST /analysis/threshold
// ---------------------------------------------------------------------------

/// Sweep candidate buffers and return the cheapest one with the full curve.
pub async fn optimize_threshold(
    State(state): State<AppState>,
    Json(body): Json<ThresholdRequest>,
) -> AppResult<impl IntoResponse> {
    let records = resolve_records(&state, body.dataset, body.records).await?;
    let filter = DelayFilter {
        ended_only: body.ended_only,
        scope: body.scope,
    };

    let result = threshold::optimize(&records, &filter, &body.cost, &body.search)?;

    tracing::info!(
        records = records.len(),
        considered = result.records_considered,
        threshold_minutes = result.threshold_minutes,
        total_cost = result.total_cost,
        "Computed optimal delay threshold",
    );

    Ok(Json(DataResponse { data: result }))
}

// ---------------------------------------------------------------------------
// POST /analysis/impact
// ---------------------------------------------------------------------------

/// KPIs and delay distribution for a single buffer.
pub async fn threshold_impact(
    State(state): State<AppState>,
    Json(body): Json<ImpactRequest>,
) -> AppResult<impl IntoResponse> {
    let records = resolve_records(&state, body.dataset, body.records).await?;
    let filter = DelayFilter {
        ended_only: body.ended_only,
        scope: body.scope,
    };

    let impact = delay::impact(&records, &filter, body.threshold_minutes);
    let histogram = delay::delay_histogram(&records, &filter, body.bin_width_minutes)?;

    Ok(Json(DataResponse {
        data: ImpactResponse { impact, histogram },
    }))
}
