//! Offline training: historical pricing rows in, one [`ModelArtifact`] out.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::artifact::ModelArtifact;
use crate::encoding::{FeatureEncoder, UnknownCategoryPolicy};
use crate::error::{from_validation_errors, out_of_range, CoreError};
use crate::features::VehicleFeatures;
use crate::metrics::EvaluationMetrics;
use crate::regression::RidgeRegression;
use crate::types::ModelVersion;

/// One historical listing: the vehicle and the price its owner asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRow {
    #[serde(flatten)]
    pub features: VehicleFeatures,
    pub rental_price_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TrainingConfig {
    /// Share of rows held out for evaluation. `0` evaluates on the
    /// training rows.
    #[validate(range(min = 0.0, max = 0.9, message = "test fraction must be between 0 and 0.9"))]
    pub test_fraction: f64,
    pub seed: u64,
    #[validate(range(exclusive_min = 0.0, message = "ridge alpha must be positive"))]
    pub ridge_alpha: f64,
    #[validate(range(min = 2, message = "at least 2 training rows are required"))]
    pub min_rows: usize,
    /// Categories seen fewer times than this are left out of the vocabulary.
    #[validate(range(min = 1, message = "minimum category count must be at least 1"))]
    pub min_category_count: usize,
    pub unknown_category_policy: UnknownCategoryPolicy,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            ridge_alpha: 1.0,
            min_rows: 10,
            min_category_count: 1,
            unknown_category_policy: UnknownCategoryPolicy::OtherColumn,
        }
    }
}

impl TrainingConfig {
    pub fn checked(self) -> Result<Self, CoreError> {
        if !self.test_fraction.is_finite() {
            return Err(out_of_range("test_fraction", "must be a finite number"));
        }
        if !self.ridge_alpha.is_finite() {
            return Err(out_of_range("ridge_alpha", "must be a finite number"));
        }
        self.validate().map_err(from_validation_errors)?;
        Ok(self)
    }
}

/// Fit an artifact from historical rows.
///
/// Every failure is reported as [`CoreError::TrainingFailed`]; the caller
/// is expected to keep serving its previous artifact.
pub fn fit(
    rows: &[PricingRow],
    config: &TrainingConfig,
    version: ModelVersion,
) -> Result<ModelArtifact, CoreError> {
    let config = config
        .clone()
        .checked()
        .map_err(|e| CoreError::TrainingFailed(format!("invalid training config: {e}")))?;

    if rows.len() < config.min_rows {
        return Err(CoreError::TrainingFailed(format!(
            "{} rows supplied, at least {} required",
            rows.len(),
            config.min_rows
        )));
    }

    let mut features = Vec::with_capacity(rows.len());
    let mut targets = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let price = row.rental_price_per_day;
        if !price.is_finite() || price < 0.0 {
            return Err(CoreError::TrainingFailed(format!(
                "row {i}: rental_price_per_day must be a finite non-negative number, got {price}"
            )));
        }
        let normalized = row
            .features
            .normalized()
            .map_err(|e| CoreError::TrainingFailed(format!("row {i}: {e}")))?;
        features.push(normalized);
        targets.push(price);
    }

    let (train_idx, test_idx) = split_indices(rows.len(), config.test_fraction, config.seed);

    let train_features: Vec<&VehicleFeatures> = train_idx.iter().map(|&i| &features[i]).collect();
    let encoder = FeatureEncoder::fit(
        &train_features,
        config.min_category_count,
        config.unknown_category_policy,
    )?;

    let x_train = encoder.encode_matrix(&train_features)?;
    let y_train: Array1<f64> = train_idx.iter().map(|&i| targets[i]).collect();
    let model = RidgeRegression::fit(x_train.view(), y_train.view(), config.ridge_alpha)?;

    // Without a held-out partition, report fit quality on the training rows.
    let eval_idx = if test_idx.is_empty() { &train_idx } else { &test_idx };
    let eval_features: Vec<&VehicleFeatures> = eval_idx.iter().map(|&i| &features[i]).collect();
    let predicted = model.predict_matrix(encoder.encode_matrix(&eval_features)?.view());
    let actual: Vec<f64> = eval_idx.iter().map(|&i| targets[i]).collect();
    let metrics = EvaluationMetrics::score(&actual, &predicted.to_vec(), train_idx.len());

    Ok(ModelArtifact::new(version, chrono::Utc::now(), encoder, model, metrics))
}

/// Deterministic train/test split. At least one row always stays in the
/// training partition.
pub fn split_indices(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = ((n as f64) * test_fraction).round() as usize;
    let test_len = test_len.min(n.saturating_sub(1));
    let train = indices.split_off(test_len);
    (train, indices)
}
