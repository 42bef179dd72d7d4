//! Versioned model artifact persistence.
//!
//! [`FsArtifactStore`] keeps one JSON file per version plus a `LATEST`
//! alias holding the newest version number. Each write goes to its own
//! temp file first. An artifact file is published with a hard link, which
//! fails if the version already exists; the alias is renamed into place
//! under a lock and only ever moves forward.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use fleetcast_core::artifact::ModelArtifact;
use fleetcast_core::types::ModelVersion;

use crate::error::StoreError;

/// Name of the alias file pointing at the newest version.
pub const LATEST_ALIAS: &str = "LATEST";

static ARTIFACT_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^model-v(\d{6,})\.json$").expect("valid regex"));

pub fn artifact_file_name(version: ModelVersion) -> String {
    format!("model-v{:06}.json", version.0)
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist a new version. Existing versions are never overwritten.
    async fn save(&self, artifact: &ModelArtifact) -> Result<(), StoreError>;

    async fn load(&self, version: ModelVersion) -> Result<ModelArtifact, StoreError>;

    /// The newest stored artifact, if any.
    async fn load_latest(&self) -> Result<Option<ModelArtifact>, StoreError>;

    /// Stored versions, ascending.
    async fn list_versions(&self) -> Result<Vec<ModelVersion>, StoreError>;

    /// Version number the next training run should use.
    async fn next_version(&self) -> Result<ModelVersion, StoreError> {
        Ok(self
            .list_versions()
            .await?
            .last()
            .map_or(ModelVersion::FIRST, |v| v.next()))
    }
}

fn verified(artifact: ModelArtifact, expected: ModelVersion) -> Result<ModelArtifact, StoreError> {
    if artifact.version != expected {
        return Err(StoreError::Corrupt {
            version: expected,
            reason: format!("file holds version {}", artifact.version),
        });
    }
    if !artifact.verify_fingerprint() {
        return Err(StoreError::Corrupt {
            version: expected,
            reason: "fingerprint does not match parameters".into(),
        });
    }
    Ok(artifact)
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
    /// Serializes read-compare-write of the `LATEST` alias.
    alias_lock: Arc<Mutex<()>>,
}

impl FsArtifactStore {
    /// Open (and create if needed) an artifact directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self {
            dir,
            alias_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn artifact_path(&self, version: ModelVersion) -> PathBuf {
        self.dir.join(artifact_file_name(version))
    }

    async fn read_alias(&self) -> Result<Option<ModelVersion>, StoreError> {
        let path = self.dir.join(LATEST_ALIAS);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => match text.trim().parse::<u64>() {
                Ok(v) => Ok(Some(ModelVersion(v))),
                Err(_) => {
                    tracing::warn!(path = %path.display(), "Ignoring unreadable latest alias");
                    Ok(None)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn save(&self, artifact: &ModelArtifact) -> Result<(), StoreError> {
        let path = self.artifact_path(artifact.version);
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        if exists {
            return Err(StoreError::AlreadyExists(artifact.version));
        }

        let bytes = serde_json::to_vec_pretty(artifact)?;
        let tmp = write_temp(&path, &bytes).await?;
        let linked = tokio::fs::hard_link(&tmp, &path).await;
        let _ = tokio::fs::remove_file(&tmp).await;
        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(artifact.version));
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        }

        {
            let _guard = self.alias_lock.lock().await;
            let newest = self.read_alias().await?;
            if newest.map_or(true, |v| v < artifact.version) {
                let alias = self.dir.join(LATEST_ALIAS);
                replace_atomic(&alias, artifact.version.0.to_string().as_bytes()).await?;
            }
        }

        tracing::info!(
            version = %artifact.version,
            path = %path.display(),
            fingerprint = %artifact.fingerprint,
            "Saved model artifact",
        );
        Ok(())
    }

    async fn load(&self, version: ModelVersion) -> Result<ModelArtifact, StoreError> {
        let path = self.artifact_path(version);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(format!("model {version}")));
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };
        let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;
        verified(artifact, version)
    }

    async fn load_latest(&self) -> Result<Option<ModelArtifact>, StoreError> {
        let version = match self.read_alias().await? {
            Some(v) => Some(v),
            None => self.list_versions().await?.last().copied(),
        };
        match version {
            Some(v) => self.load(v).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_versions(&self) -> Result<Vec<ModelVersion>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?;

        let mut versions = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?
        {
            let name = entry.file_name();
            let Some(caps) = name.to_str().and_then(|n| ARTIFACT_FILE_RE.captures(n)) else {
                continue;
            };
            if let Ok(v) = caps[1].parse::<u64>() {
                versions.push(ModelVersion(v));
            }
        }
        versions.sort();
        Ok(versions)
    }
}

/// Per-process counter keeping concurrent temp files apart.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `bytes` to a fresh hidden sibling of `path` and sync it.
async fn write_temp(path: &Path, bytes: &[u8]) -> Result<PathBuf, StoreError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact");
    let tmp = path.with_file_name(format!(
        ".{name}.{}.{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
    ));

    let written = async {
        let mut file = tokio::fs::File::create_new(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(StoreError::io(&tmp, e));
    }
    Ok(tmp)
}

/// Write `bytes` to a temp file, sync it, then rename over `path`.
async fn replace_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = write_temp(path, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(StoreError::io(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<BTreeMap<ModelVersion, ModelArtifact>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn save(&self, artifact: &ModelArtifact) -> Result<(), StoreError> {
        let mut artifacts = self.artifacts.write().await;
        if artifacts.contains_key(&artifact.version) {
            return Err(StoreError::AlreadyExists(artifact.version));
        }
        artifacts.insert(artifact.version, artifact.clone());
        Ok(())
    }

    async fn load(&self, version: ModelVersion) -> Result<ModelArtifact, StoreError> {
        let artifact = self
            .artifacts
            .read()
            .await
            .get(&version)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("model {version}")))?;
        verified(artifact, version)
    }

    async fn load_latest(&self) -> Result<Option<ModelArtifact>, StoreError> {
        let latest = self
            .artifacts
            .read()
            .await
            .iter()
            .next_back()
            .map(|(version, artifact)| (*version, artifact.clone()));
        latest
            .map(|(version, artifact)| verified(artifact, version))
            .transpose()
    }

    async fn list_versions(&self) -> Result<Vec<ModelVersion>, StoreError> {
        Ok(self.artifacts.read().await.keys().copied().collect())
    }
}
