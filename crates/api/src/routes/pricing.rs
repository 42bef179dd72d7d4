use axum::routing::post;
use axum::Router;

use crate::handlers::pricing;
use crate::state::AppState;

/// Inference routes mounted at `/predict`.
///
/// ```text
/// POST /                  -> predict
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(pricing::predict))
}
