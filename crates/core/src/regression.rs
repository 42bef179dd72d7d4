//! Ridge regression solved in closed form.
//!
//! Columns and target are centered so the intercept is not penalized, then
//! `(XᵀX + αI) β = Xᵀy` is solved by Cholesky factorization. A system that
//! is not positive definite, or a solution that is not finite, is reported
//! as [`CoreError::TrainingFailed`].

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Diagonal pivots at or below this are treated as a singular system.
const PIVOT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    pub alpha: f64,
}

impl RidgeRegression {
    /// Fit on a design matrix with one row per observation.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        alpha: f64,
    ) -> Result<Self, CoreError> {
        let (rows, d) = x.dim();
        if rows == 0 {
            return Err(CoreError::TrainingFailed("no training rows".into()));
        }
        if rows != y.len() {
            return Err(CoreError::TrainingFailed(format!(
                "{rows} feature rows but {} targets",
                y.len()
            )));
        }
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(CoreError::TrainingFailed(format!(
                "ridge alpha must be a finite non-negative number, got {alpha}"
            )));
        }

        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| CoreError::TrainingFailed("no training rows".into()))?;
        let y_mean = y.sum() / rows as f64;

        // Normal equations on centered data.
        let xc = &x - &x_mean;
        let yc = &y - y_mean;
        let mut gram = xc.t().dot(&xc);
        for v in gram.diag_mut() {
            *v += alpha;
        }
        let rhs = xc.t().dot(&yc);

        let coefficients = solve_cholesky(gram, rhs.view())?;
        let intercept = y_mean - coefficients.dot(&x_mean);

        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(CoreError::TrainingFailed(
                "regression produced non-finite coefficients".into(),
            ));
        }
        debug_assert_eq!(coefficients.len(), d);

        Ok(Self {
            intercept,
            coefficients: coefficients.to_vec(),
            alpha,
        })
    }

    /// Raw (unclamped) prediction. The caller guarantees `row.len()` matches.
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept + ArrayView1::from(row).dot(&ArrayView1::from(self.coefficients.as_slice()))
    }

    /// Raw predictions for every row of `x`.
    pub fn predict_matrix(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.dot(&ArrayView1::from(self.coefficients.as_slice())) + self.intercept
    }
}

/// Solve `A x = b` for symmetric positive-definite `A`.
fn solve_cholesky(mut a: Array2<f64>, b: ArrayView1<'_, f64>) -> Result<Array1<f64>, CoreError> {
    let d = b.len();

    // In-place lower-triangular factor.
    for j in 0..d {
        let head = a.slice(s![j, ..j]);
        let diag = a[[j, j]] - head.dot(&head);
        if !diag.is_finite() || diag <= PIVOT_EPSILON {
            return Err(CoreError::TrainingFailed(format!(
                "normal equations are not positive definite (pivot {j}); \
                 increase ridge alpha or remove constant features"
            )));
        }
        let l_jj = diag.sqrt();
        a[[j, j]] = l_jj;
        for i in (j + 1)..d {
            let s = a[[i, j]] - a.slice(s![i, ..j]).dot(&a.slice(s![j, ..j]));
            a[[i, j]] = s / l_jj;
        }
    }

    // Forward: L z = b.
    let mut z = Array1::<f64>::zeros(d);
    for i in 0..d {
        let s = a.slice(s![i, ..i]).dot(&z.slice(s![..i]));
        z[i] = (b[i] - s) / a[[i, i]];
    }

    // Backward: Lᵀ x = z.
    let mut x = Array1::<f64>::zeros(d);
    for i in (0..d).rev() {
        let s = a.slice(s![(i + 1).., i]).dot(&x.slice(s![(i + 1)..]));
        x[i] = (z[i] - s) / a[[i, i]];
    }

    Ok(x)
}
