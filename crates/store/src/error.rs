use std::path::PathBuf;

use fleetcast_core::types::ModelVersion;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Model version {0} already exists")]
    AlreadyExists(ModelVersion),

    /// Stored artifact does not match its own fingerprint or file name.
    #[error("Artifact {version} is corrupt: {reason}")]
    Corrupt {
        version: ModelVersion,
        reason: String,
    },

    #[error("Invalid dataset name '{0}'")]
    InvalidName(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
