//! Versioned, immutable model artifacts.
//!
//! An artifact binds a fitted [`RidgeRegression`] to the exact feature
//! space it was trained on: the input fields it expects, the encoded column
//! names, and the categorical vocabulary inside its [`FeatureEncoder`].
//! Artifacts are created once by training and never modified; a new
//! training run produces a new artifact with a new version.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::encoding::{FeatureEncoder, UnknownCategoryPolicy};
use crate::error::CoreError;
use crate::metrics::EvaluationMetrics;
use crate::regression::RidgeRegression;
use crate::schema;
use crate::types::{ModelVersion, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: ModelVersion,
    pub trained_at: Timestamp,
    /// Schema fields the artifact reads, in order.
    pub input_fields: Vec<String>,
    /// Encoded column names, in order; one coefficient per name.
    pub feature_names: Vec<String>,
    pub encoder: FeatureEncoder,
    pub model: RidgeRegression,
    pub metrics: EvaluationMetrics,
    /// SHA-256 over the fitted parameters (hex).
    pub fingerprint: String,
}

/// Serving-facing description of an artifact, without its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub version: ModelVersion,
    pub trained_at: Timestamp,
    pub feature_count: usize,
    pub unknown_category_policy: UnknownCategoryPolicy,
    pub metrics: EvaluationMetrics,
    pub fingerprint: String,
}

impl ModelArtifact {
    pub fn new(
        version: ModelVersion,
        trained_at: Timestamp,
        encoder: FeatureEncoder,
        model: RidgeRegression,
        metrics: EvaluationMetrics,
    ) -> Self {
        let mut artifact = Self {
            version,
            trained_at,
            input_fields: encoder.input_fields(),
            feature_names: encoder.feature_names(),
            encoder,
            model,
            metrics,
            fingerprint: String::new(),
        };
        artifact.fingerprint = artifact.compute_fingerprint();
        artifact
    }

    /// Hash of everything that influences a prediction.
    ///
    /// Version, timestamp and metrics are excluded, so two runs over the
    /// same data with the same seed produce the same fingerprint.
    pub fn compute_fingerprint(&self) -> String {
        let params = serde_json::json!({
            "input_fields": self.input_fields,
            "feature_names": self.feature_names,
            "encoder": self.encoder,
            "model": self.model,
        });
        let hash = Sha256::digest(params.to_string().as_bytes());
        format!("{hash:x}")
    }

    pub fn verify_fingerprint(&self) -> bool {
        self.fingerprint == self.compute_fingerprint()
    }

    /// Check the artifact can serve the current input schema.
    pub fn check_alignment(&self) -> Result<(), CoreError> {
        let expected = schema::field_names();
        if self.input_fields != expected {
            return Err(CoreError::FeatureMismatch(format!(
                "artifact {} expects {} input fields [{}], schema provides {} [{}]",
                self.version,
                self.input_fields.len(),
                self.input_fields.join(", "),
                expected.len(),
                expected.join(", "),
            )));
        }
        if self.encoder.input_fields() != self.input_fields {
            return Err(CoreError::FeatureMismatch(format!(
                "artifact {} encoder fields disagree with its declared input fields",
                self.version
            )));
        }

        let dim = self.encoder.dimension();
        if dim != self.model.coefficients.len() || dim != self.feature_names.len() {
            return Err(CoreError::FeatureMismatch(format!(
                "artifact {} encodes {dim} columns but has {} coefficients and {} feature names",
                self.version,
                self.model.coefficients.len(),
                self.feature_names.len(),
            )));
        }
        Ok(())
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            version: self.version,
            trained_at: self.trained_at,
            feature_count: self.feature_names.len(),
            unknown_category_policy: self.encoder.unknown_policy,
            metrics: self.metrics.clone(),
            fingerprint: self.fingerprint.clone(),
        }
    }
}
