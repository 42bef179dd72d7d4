//! Training-time feature space and its inference-time reconstruction.
//!
//! Layout of an encoded row, always in this order:
//!
//! 1. numeric fields, standardized with the training mean / std-dev;
//! 2. one block per categorical field, one column per vocabulary entry
//!    (sorted), plus a trailing [`OTHER_COLUMN`] when the policy is
//!    [`UnknownCategoryPolicy::OtherColumn`];
//! 3. boolean fields as `0.0` / `1.0`.
//!
//! Unknown categories never fail encoding. What they encode to is decided
//! by [`UnknownCategoryPolicy`], which is stored in the artifact.

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::features::VehicleFeatures;
use crate::schema;

/// Name of the reserved column that absorbs unknown categories.
pub const OTHER_COLUMN: &str = "__other__";

/// How a categorical value outside the training vocabulary is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategoryPolicy {
    /// Light the field's reserved `__other__` column. Training routes
    /// categories rarer than `min_category_count` through this column so it
    /// carries a learned weight.
    OtherColumn,
    /// Encode the whole block as zeros, so the value contributes nothing.
    Ignore,
}

// ---------------------------------------------------------------------------
// Numeric scaling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericScaler {
    pub field: String,
    pub mean: f64,
    pub std_dev: f64,
}

impl NumericScaler {
    /// Fit mean and population std-dev. A constant column gets `std_dev = 1`.
    pub fn fit(field: &str, values: &[f64]) -> Self {
        let n = values.len().max(1) as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        Self {
            field: field.to_string(),
            mean,
            std_dev: if std_dev > f64::EPSILON { std_dev } else { 1.0 },
        }
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }
}

// ---------------------------------------------------------------------------
// Categorical vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    pub field: String,
    /// Known categories, sorted.
    pub categories: Vec<String>,
}

impl CategoryVocabulary {
    /// Keep every category seen at least `min_count` times.
    pub fn fit<'a>(
        field: &str,
        values: impl IntoIterator<Item = &'a str>,
        min_count: usize,
    ) -> Self {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for v in values {
            *counts.entry(v).or_default() += 1;
        }
        let categories = counts
            .into_iter()
            .filter(|(_, c)| *c >= min_count.max(1))
            .map(|(v, _)| v.to_string())
            .collect();
        Self {
            field: field.to_string(),
            categories,
        }
    }

    pub fn column_count(&self, policy: UnknownCategoryPolicy) -> usize {
        match policy {
            UnknownCategoryPolicy::OtherColumn => self.categories.len() + 1,
            UnknownCategoryPolicy::Ignore => self.categories.len(),
        }
    }

    pub fn position(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Append this field's one-hot block. Returns `false` when the value was
    /// not in the vocabulary and the unknown policy was applied.
    fn encode_into(&self, value: &str, policy: UnknownCategoryPolicy, out: &mut Vec<f64>) -> bool {
        let start = out.len();
        out.resize(start + self.column_count(policy), 0.0);
        match (self.position(value), policy) {
            (Some(i), _) => {
                out[start + i] = 1.0;
                true
            }
            (None, UnknownCategoryPolicy::OtherColumn) => {
                out[start + self.categories.len()] = 1.0;
                false
            }
            (None, UnknownCategoryPolicy::Ignore) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// An encoded row plus the categorical fields that fell back.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    pub values: Vec<f64>,
    pub fallback_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    pub numeric: Vec<NumericScaler>,
    pub categorical: Vec<CategoryVocabulary>,
    pub boolean: Vec<String>,
    pub unknown_policy: UnknownCategoryPolicy,
}

impl FeatureEncoder {
    /// Fit scalers and vocabularies on training rows.
    pub fn fit(
        rows: &[&VehicleFeatures],
        min_category_count: usize,
        unknown_policy: UnknownCategoryPolicy,
    ) -> Result<Self, CoreError> {
        if rows.is_empty() {
            return Err(CoreError::TrainingFailed(
                "cannot fit an encoder on zero rows".into(),
            ));
        }

        let numeric = schema::numeric_fields()
            .map(|field| {
                let values: Vec<f64> = rows.iter().filter_map(|r| r.numeric(field)).collect();
                NumericScaler::fit(field, &values)
            })
            .collect();

        let categorical = schema::categorical_fields()
            .map(|field| {
                CategoryVocabulary::fit(
                    field,
                    rows.iter().filter_map(|r| r.categorical(field)),
                    min_category_count,
                )
            })
            .collect();

        let boolean = schema::boolean_fields().map(str::to_string).collect();

        Ok(Self {
            numeric,
            categorical,
            boolean,
            unknown_policy,
        })
    }

    /// Input fields this encoder reads, in encoding order.
    pub fn input_fields(&self) -> Vec<String> {
        self.numeric
            .iter()
            .map(|s| s.field.clone())
            .chain(self.categorical.iter().map(|v| v.field.clone()))
            .chain(self.boolean.iter().cloned())
            .collect()
    }

    /// Names of the encoded columns, in order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|s| s.field.clone()).collect();
        for vocab in &self.categorical {
            names.extend(vocab.categories.iter().map(|c| format!("{}={c}", vocab.field)));
            if self.unknown_policy == UnknownCategoryPolicy::OtherColumn {
                names.push(format!("{}={OTHER_COLUMN}", vocab.field));
            }
        }
        names.extend(self.boolean.iter().cloned());
        names
    }

    pub fn dimension(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|v| v.column_count(self.unknown_policy))
                .sum::<usize>()
            + self.boolean.len()
    }

    /// Rebuild the training-time feature vector for one vehicle.
    ///
    /// Fails with [`CoreError::FeatureMismatch`] only when the encoder
    /// references a field that [`VehicleFeatures`] does not carry.
    pub fn encode(&self, features: &VehicleFeatures) -> Result<EncodedRow, CoreError> {
        let mut values = Vec::with_capacity(self.dimension());
        let mut fallback_fields = Vec::new();

        for scaler in &self.numeric {
            let raw = features
                .numeric(&scaler.field)
                .ok_or_else(|| missing_field(&scaler.field, "numeric"))?;
            values.push(scaler.transform(raw));
        }

        for vocab in &self.categorical {
            let raw = features
                .categorical(&vocab.field)
                .ok_or_else(|| missing_field(&vocab.field, "categorical"))?;
            if !vocab.encode_into(raw, self.unknown_policy, &mut values) {
                fallback_fields.push(vocab.field.clone());
            }
        }

        for field in &self.boolean {
            let raw = features
                .flag(field)
                .ok_or_else(|| missing_field(field, "boolean"))?;
            values.push(if raw { 1.0 } else { 0.0 });
        }

        Ok(EncodedRow {
            values,
            fallback_fields,
        })
    }
}

impl FeatureEncoder {
    /// Design matrix with one encoded row per vehicle.
    pub fn encode_matrix(&self, rows: &[&VehicleFeatures]) -> Result<Array2<f64>, CoreError> {
        let mut matrix = Array2::zeros((rows.len(), self.dimension()));
        for (mut out, features) in matrix.axis_iter_mut(Axis(0)).zip(rows) {
            let encoded = self.encode(features)?;
            out.assign(&ArrayView1::from(encoded.values.as_slice()));
        }
        Ok(matrix)
    }
}

fn missing_field(field: &str, kind: &str) -> CoreError {
    CoreError::FeatureMismatch(format!(
        "model expects {kind} field '{field}' which the input schema does not provide"
    ))
}
