use axum::routing::post;
use axum::Router;

use crate::handlers::analysis;
use crate::state::AppState;

/// Delay analysis routes mounted at `/analysis`.
///
/// ```text
/// POST /threshold         -> optimize_threshold
/// POST /impact            -> threshold_impact
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/threshold", post(analysis::optimize_threshold))
        .route("/impact", post(analysis::threshold_impact))
}
