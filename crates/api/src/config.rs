use std::path::PathBuf;

use fleetcast_core::pricing::PricingConfig;

/// A configuration variable that is present but unusable.
#[derive(Debug, thiserror::Error)]
#[error("{var} is invalid: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory holding versioned model artifacts.
    pub model_dir: PathBuf,
    /// Directory holding named delay datasets.
    pub dataset_dir: PathBuf,
    pub pricing: PricingConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `MODEL_DIR`            | `./data/models`         |
    /// | `DATASET_DIR`          | `./data/datasets`       |
    /// | `PRICE_FLOOR`          | `0`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = parse_var("PORT", "3000")?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(bad) = cors_origins
            .iter()
            .find(|o| o.parse::<axum::http::HeaderValue>().is_err())
        {
            return Err(ConfigError {
                var: "CORS_ORIGINS",
                reason: format!("'{bad}' is not a valid origin"),
            });
        }

        let request_timeout_secs: u64 = parse_var("REQUEST_TIMEOUT_SECS", "30")?;
        let model_dir = PathBuf::from(
            std::env::var("MODEL_DIR").unwrap_or_else(|_| "./data/models".into()),
        );
        let dataset_dir = PathBuf::from(
            std::env::var("DATASET_DIR").unwrap_or_else(|_| "./data/datasets".into()),
        );

        let price_floor: f64 = parse_var("PRICE_FLOOR", "0")?;
        let pricing = PricingConfig { price_floor }
            .checked()
            .map_err(|e| ConfigError {
                var: "PRICE_FLOOR",
                reason: e.to_string(),
            })?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            model_dir,
            dataset_dir,
            pricing,
        })
    }
}

/// Read and parse an environment variable, falling back to `default`.
pub fn parse_var<T>(var: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    raw.trim().parse().map_err(|e: T::Err| ConfigError {
        var,
        reason: format!("'{raw}': {e}"),
    })
}
