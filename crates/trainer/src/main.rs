use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleetcast_trainer::TrainerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fleetcast_trainer=info,fleetcast_store=info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json");
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = TrainerConfig::from_env()?;
    tracing::info!(
        data = %config.data_path.display(),
        model_dir = %config.model_dir.display(),
        seed = config.training.seed,
        "Trainer starting",
    );

    let artifact = fleetcast_trainer::run(&config).await?;
    tracing::info!(version = %artifact.version, "Training run complete");
    Ok(())
}
