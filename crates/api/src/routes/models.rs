use axum::routing::{get, post};
use axum::Router;

use crate::handlers::models;
use crate::state::AppState;

/// Model management routes mounted at `/models`.
///
/// ```text
/// GET  /                  -> list_models
/// GET  /current           -> current_model
/// POST /reload            -> reload_model
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(models::list_models))
        .route("/current", get(models::current_model))
        .route("/reload", post(models::reload_model))
}
