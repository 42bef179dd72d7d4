use std::sync::Arc;

use fleetcast_core::registry::ModelRegistry;
use fleetcast_store::{ArtifactStore, DatasetStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// The published price model.
    pub registry: Arc<ModelRegistry>,
    /// Where artifacts are loaded from on startup and reload.
    pub artifacts: Arc<dyn ArtifactStore>,
    pub datasets: Arc<DatasetStore>,
}
