use std::net::SocketAddr;
use std::sync::Arc;

use fleetcast_core::registry::ModelRegistry;
use fleetcast_store::{ArtifactStore, DatasetStore, FsArtifactStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleetcast_api::config::ServerConfig;
use fleetcast_api::router::build_app_router;
use fleetcast_api::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fleetcast_api=debug,fleetcast_store=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Stores ---
    let artifacts = FsArtifactStore::open(&config.model_dir).await?;
    let datasets = DatasetStore::new(&config.dataset_dir);
    tracing::info!(
        model_dir = %config.model_dir.display(),
        dataset_dir = %config.dataset_dir.display(),
        "Opened stores",
    );

    // --- Model ---
    let registry = Arc::new(ModelRegistry::new());
    match artifacts.load_latest().await {
        Ok(Some(artifact)) => match registry.publish(artifact) {
            Ok(published) => {
                tracing::info!(version = %published.version, "Published latest model artifact");
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Latest model artifact cannot be served; starting without a model",
                );
            }
        },
        Ok(None) => {
            tracing::warn!("No model artifact found; predictions unavailable until a reload");
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                "Failed to load latest model artifact; starting without a model",
            );
        }
    }

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        registry,
        artifacts: Arc::new(artifacts),
        datasets: Arc::new(datasets),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(config.host.parse()?, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
