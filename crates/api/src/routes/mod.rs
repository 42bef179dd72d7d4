pub mod analysis;
pub mod health;
pub mod models;
pub mod pricing;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /predict                                 price inference (POST)
///
/// /analysis/threshold                      optimal delay buffer (POST)
/// /analysis/impact                         KPIs for one buffer (POST)
///
/// /models                                  stored versions
/// /models/current                          published model summary
/// /models/reload                           publish from store (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/predict", pricing::router())
        .nest("/analysis", analysis::router())
        .nest("/models", models::router())
}
