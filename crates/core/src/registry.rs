//! The currently published model artifact.
//!
//! Readers clone the `Arc` and release the lock before doing any work, so
//! a publish never waits on inference and in-flight predictions keep the
//! snapshot they started with.

use std::sync::{Arc, RwLock};

use crate::artifact::ModelArtifact;
use crate::error::CoreError;
use crate::features::VehicleFeatures;
use crate::pricing::{self, PriceEstimate, PricingConfig};
use crate::types::ModelVersion;

#[derive(Debug, Default)]
pub struct ModelRegistry {
    current: RwLock<Option<Arc<ModelArtifact>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a newer artifact.
    ///
    /// Rejects artifacts that cannot serve the current schema and versions
    /// not strictly newer than the published one.
    pub fn publish(&self, artifact: ModelArtifact) -> Result<Arc<ModelArtifact>, CoreError> {
        artifact.check_alignment()?;
        let artifact = Arc::new(artifact);

        let mut slot = self
            .current
            .write()
            .map_err(|_| CoreError::Internal("model registry lock poisoned".into()))?;
        if let Some(existing) = slot.as_ref() {
            if artifact.version <= existing.version {
                return Err(CoreError::Conflict(format!(
                    "model {} is not newer than published model {}",
                    artifact.version, existing.version
                )));
            }
        }
        *slot = Some(Arc::clone(&artifact));
        Ok(artifact)
    }

    /// Snapshot of the published artifact.
    pub fn current(&self) -> Result<Arc<ModelArtifact>, CoreError> {
        self.current
            .read()
            .map_err(|_| CoreError::Internal("model registry lock poisoned".into()))?
            .clone()
            .ok_or(CoreError::ModelNotLoaded)
    }

    pub fn current_version(&self) -> Option<ModelVersion> {
        self.current().ok().map(|a| a.version)
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_ok()
    }

    pub fn predict(
        &self,
        features: &VehicleFeatures,
        config: &PricingConfig,
    ) -> Result<PriceEstimate, CoreError> {
        let artifact = self.current()?;
        pricing::predict(features, &artifact, config)
    }

    /// Predict a batch against one snapshot, so every estimate in the
    /// result carries the same model version.
    pub fn predict_batch(
        &self,
        batch: &[VehicleFeatures],
        config: &PricingConfig,
    ) -> Result<(ModelVersion, Vec<PriceEstimate>), CoreError> {
        let artifact = self.current()?;
        let estimates = pricing::predict_batch(batch, &artifact, config)?;
        Ok((artifact.version, estimates))
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use assert_matches::assert_matches;

    use super::*;
    use crate::artifact::tests::sample_artifact;
    use crate::encoding::UnknownCategoryPolicy;
    use crate::features::tests::sample_payload;
    use crate::features::validate;

    fn versioned(v: u64) -> ModelArtifact {
        let mut a = sample_artifact(UnknownCategoryPolicy::OtherColumn);
        a.version = ModelVersion(v);
        a.model.intercept = 100.0 * v as f64;
        a.fingerprint = a.compute_fingerprint();
        a
    }

    #[test]
    fn empty_registry_reports_model_not_loaded() {
        let registry = ModelRegistry::new();
        assert!(!registry.is_loaded());
        assert_eq!(registry.current_version(), None);
        let features = validate(&sample_payload()).unwrap();
        assert_matches!(
            registry.predict(&features, &PricingConfig::default()),
            Err(CoreError::ModelNotLoaded)
        );
    }

    #[test]
    fn publish_then_predict() {
        let registry = ModelRegistry::new();
        registry.publish(versioned(1)).unwrap();
        let features = validate(&sample_payload()).unwrap();
        let estimate = registry.predict(&features, &PricingConfig::default()).unwrap();
        assert_eq!(estimate.model_version, ModelVersion(1));
    }

    #[test]
    fn stale_or_equal_version_is_rejected() {
        let registry = ModelRegistry::new();
        registry.publish(versioned(2)).unwrap();
        assert_matches!(registry.publish(versioned(2)), Err(CoreError::Conflict(_)));
        assert_matches!(registry.publish(versioned(1)), Err(CoreError::Conflict(_)));
        assert_eq!(registry.current_version(), Some(ModelVersion(2)));
        registry.publish(versioned(3)).unwrap();
        assert_eq!(registry.current_version(), Some(ModelVersion(3)));
    }

    #[test]
    fn misaligned_artifact_is_never_published() {
        let registry = ModelRegistry::new();
        let mut bad = versioned(1);
        bad.model.coefficients.clear();
        assert_matches!(registry.publish(bad), Err(CoreError::FeatureMismatch(_)));
        assert!(!registry.is_loaded());
    }

    #[test]
    fn snapshot_survives_a_publish() {
        let registry = ModelRegistry::new();
        registry.publish(versioned(1)).unwrap();
        let snapshot = registry.current().unwrap();
        registry.publish(versioned(2)).unwrap();
        assert_eq!(snapshot.version, ModelVersion(1));
        assert_eq!(registry.current().unwrap().version, ModelVersion(2));
    }

    #[test]
    fn concurrent_readers_see_complete_artifacts() {
        let registry = Arc::new(ModelRegistry::new());
        registry.publish(versioned(1)).unwrap();
        let features = validate(&sample_payload()).unwrap();

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let features = features.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let artifact = registry.current().unwrap();
                        assert!(artifact.verify_fingerprint());
                        let estimate =
                            pricing::predict(&features, &artifact, &PricingConfig::default())
                                .unwrap();
                        assert_eq!(estimate.model_version, artifact.version);
                    }
                })
            })
            .collect();

        for v in 2..=20 {
            registry.publish(versioned(v)).unwrap();
        }
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(registry.current_version(), Some(ModelVersion(20)));
    }
}
