//! Price prediction against a single artifact.
//!
//! Pure functions: the artifact is passed in explicitly, so concurrent
//! calls against different artifacts never interact. The published
//! artifact lives in [`crate::registry::ModelRegistry`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::artifact::ModelArtifact;
use crate::error::{from_validation_errors, out_of_range, CoreError};
use crate::features::{validate, VehicleFeatures};
use crate::types::ModelVersion;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PricingConfig {
    /// Lowest price ever returned. Raw model output below it is clamped.
    #[validate(range(min = 0.0, message = "price floor must be a non-negative number"))]
    pub price_floor: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self { price_floor: 0.0 }
    }
}

impl PricingConfig {
    pub fn checked(self) -> Result<Self, CoreError> {
        if !self.price_floor.is_finite() {
            return Err(out_of_range("price_floor", "price floor must be a finite number"));
        }
        self.validate().map_err(from_validation_errors)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceEstimate {
    pub predicted_price: f64,
    pub model_version: ModelVersion,
}

/// Predict the daily price of one vehicle.
pub fn predict(
    features: &VehicleFeatures,
    artifact: &ModelArtifact,
    config: &PricingConfig,
) -> Result<PriceEstimate, CoreError> {
    artifact.check_alignment()?;
    predict_aligned(features, artifact, config)
}

/// Predict a batch. Alignment is checked once; the first failure aborts.
pub fn predict_batch(
    batch: &[VehicleFeatures],
    artifact: &ModelArtifact,
    config: &PricingConfig,
) -> Result<Vec<PriceEstimate>, CoreError> {
    artifact.check_alignment()?;
    batch
        .iter()
        .map(|features| predict_aligned(features, artifact, config))
        .collect()
}

/// Validate a raw payload, then predict.
pub fn predict_raw(
    raw: &Map<String, Value>,
    artifact: &ModelArtifact,
    config: &PricingConfig,
) -> Result<PriceEstimate, CoreError> {
    let features = validate(raw)?;
    predict(&features, artifact, config)
}

fn predict_aligned(
    features: &VehicleFeatures,
    artifact: &ModelArtifact,
    config: &PricingConfig,
) -> Result<PriceEstimate, CoreError> {
    let row = artifact.encoder.encode(features)?;
    let raw = artifact.model.predict(&row.values);
    if !raw.is_finite() {
        return Err(CoreError::Internal(format!(
            "model {} produced a non-finite price",
            artifact.version
        )));
    }

    let floor = config.price_floor.max(0.0);
    Ok(PriceEstimate {
        predicted_price: raw.max(floor),
        model_version: artifact.version,
    })
}
