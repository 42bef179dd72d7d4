//! Named JSON datasets on disk.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use fleetcast_core::delay::DelayRecord;
use fleetcast_core::training::PricingRow;

use crate::error::StoreError;

static DATASET_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{0,63}$").expect("valid regex"));

/// Delay datasets stored as `<dir>/<name>.json`, each a JSON array of
/// [`DelayRecord`].
#[derive(Debug, Clone)]
pub struct DatasetStore {
    dir: PathBuf,
}

impl DatasetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map a dataset name to its file. Names that could escape the
    /// directory never match the pattern.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        if !DATASET_NAME_RE.is_match(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    pub async fn load_delays(&self, name: &str) -> Result<Vec<DelayRecord>, StoreError> {
        let path = self.resolve(name)?;
        let records: Vec<DelayRecord> = read_json(&path, || format!("dataset '{name}'")).await?;
        tracing::debug!(dataset = name, records = records.len(), "Loaded delay dataset");
        Ok(records)
    }

    /// Names of the datasets present, sorted.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?
        {
            let file_name = entry.file_name();
            let Some(stem) = file_name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if DATASET_NAME_RE.is_match(stem) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Read a pricing dataset: a JSON array of [`PricingRow`].
pub async fn load_pricing_rows(path: &Path) -> Result<Vec<PricingRow>, StoreError> {
    read_json(path, || format!("pricing data {}", path.display())).await
}

async fn read_json<T: DeserializeOwned>(
    path: &Path,
    what: impl FnOnce() -> String,
) -> Result<T, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(what()));
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };
    Ok(serde_json::from_slice(&bytes)?)
}
