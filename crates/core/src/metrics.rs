//! Regression evaluation metrics recorded alongside each artifact.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Mean absolute error on the evaluation partition.
    pub mae: f64,
    /// Root mean squared error on the evaluation partition.
    pub rmse: f64,
    /// Coefficient of determination on the evaluation partition.
    pub r2: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl EvaluationMetrics {
    /// Score predictions against observed values.
    ///
    /// `actual` and `predicted` must have the same, non-zero length.
    pub fn score(actual: &[f64], predicted: &[f64], train_rows: usize) -> Self {
        Self {
            mae: mean_absolute_error(actual, predicted),
            rmse: root_mean_squared_error(actual, predicted),
            r2: r2_score(actual, predicted),
            train_rows,
            test_rows: actual.len(),
        }
    }
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().max(1) as f64;
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n
}

pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().max(1) as f64;
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n;
    mse.sqrt()
}

/// R² = 1 - SS_res / SS_tot. A constant target scores 1.0 for a perfect
/// fit and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().max(1) as f64;
    let mean = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_tot <= f64::EPSILON {
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
