//! Offline training run: read a pricing dataset, fit a model, store the
//! artifact under the next free version.
//!
//! The API picks the new artifact up on its next start or on
//! `POST /api/v1/models/reload`.

use std::path::PathBuf;

use anyhow::{bail, Context};
use fleetcast_core::artifact::ModelArtifact;
use fleetcast_core::encoding::UnknownCategoryPolicy;
use fleetcast_core::training::{self, TrainingConfig};
use fleetcast_store::datasets::load_pricing_rows;
use fleetcast_store::{ArtifactStore, FsArtifactStore};

/// Trainer configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// JSON file holding `[PricingRow]`.
    pub data_path: PathBuf,
    /// Artifact directory shared with the API.
    pub model_dir: PathBuf,
    pub training: TrainingConfig,
}

impl TrainerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                    |
    /// |---------------------------|----------------------------|
    /// | `TRAINING_DATA`           | `./data/pricing.json`      |
    /// | `MODEL_DIR`               | `./data/models`            |
    /// | `TRAINING_SEED`           | `42`                       |
    /// | `TEST_FRACTION`           | `0.2`                      |
    /// | `RIDGE_ALPHA`             | `1.0`                      |
    /// | `MIN_TRAINING_ROWS`       | `10`                       |
    /// | `MIN_CATEGORY_COUNT`      | `1`                        |
    /// | `UNKNOWN_CATEGORY_POLICY` | `other_column`             |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = TrainingConfig::default();
        let data_path = PathBuf::from(
            lookup("TRAINING_DATA").unwrap_or_else(|| "./data/pricing.json".into()),
        );
        let model_dir =
            PathBuf::from(lookup("MODEL_DIR").unwrap_or_else(|| "./data/models".into()));

        let unknown_category_policy = match lookup("UNKNOWN_CATEGORY_POLICY").as_deref() {
            None | Some("other_column") => UnknownCategoryPolicy::OtherColumn,
            Some("ignore") => UnknownCategoryPolicy::Ignore,
            Some(other) => bail!("UNKNOWN_CATEGORY_POLICY is invalid: '{other}'"),
        };

        let training = TrainingConfig {
            test_fraction: parse(&lookup, "TEST_FRACTION", defaults.test_fraction)?,
            seed: parse(&lookup, "TRAINING_SEED", defaults.seed)?,
            ridge_alpha: parse(&lookup, "RIDGE_ALPHA", defaults.ridge_alpha)?,
            min_rows: parse(&lookup, "MIN_TRAINING_ROWS", defaults.min_rows)?,
            min_category_count: parse(&lookup, "MIN_CATEGORY_COUNT", defaults.min_category_count)?,
            unknown_category_policy,
        }
        .checked()
        .context("invalid training configuration")?;

        Ok(Self {
            data_path,
            model_dir,
            training,
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, var: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{var} is invalid: '{raw}'")),
        None => Ok(default),
    }
}

/// Train once and store the artifact. Returns what was stored.
pub async fn run(config: &TrainerConfig) -> anyhow::Result<ModelArtifact> {
    let rows = load_pricing_rows(&config.data_path)
        .await
        .with_context(|| format!("failed to read {}", config.data_path.display()))?;
    tracing::info!(rows = rows.len(), path = %config.data_path.display(), "Loaded training data");

    let store = FsArtifactStore::open(&config.model_dir)
        .await
        .with_context(|| format!("failed to open {}", config.model_dir.display()))?;
    let version = store.next_version().await?;

    let training = config.training.clone();
    let artifact =
        tokio::task::spawn_blocking(move || training::fit(&rows, &training, version))
            .await
            .context("training task panicked")??;

    tracing::info!(
        %version,
        train_rows = artifact.metrics.train_rows,
        test_rows = artifact.metrics.test_rows,
        mae = artifact.metrics.mae,
        rmse = artifact.metrics.rmse,
        r2 = artifact.metrics.r2,
        "Model trained",
    );

    store
        .save(&artifact)
        .await
        .with_context(|| format!("failed to store model {version}"))?;
    tracing::info!(%version, fingerprint = %artifact.fingerprint, "Model artifact stored");

    Ok(artifact)
}
