//! Ordinary Least Squares
//!
//! Fits `y = b0 + b1 x1 + ... + bk xk + e` by solving the normal equations
//! with a Cholesky factorization of X'X. Standard errors use the usual
//! homoskedastic estimate sigma^2 = RSS / (n - p).

use nalgebra::{DMatrix, DVector};

use crate::error::RegressionError;

/// Relative pivot size below which X'X is treated as singular.
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Point estimate and standard error of one coefficient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoefficientEstimate {
    pub estimate: f64,
    pub std_error: f64,
}

impl CoefficientEstimate {
    /// Whether `value` lies inside estimate +/- z * se.
    pub fn covers(&self, value: f64, z: f64) -> bool {
        (self.estimate - value).abs() <= z * self.std_error
    }
}

#[derive(Clone, Debug)]
pub struct OlsFit {
    /// Intercept first, then one entry per regressor.
    estimates: Vec<f64>,
    std_errors: Vec<f64>,
    pub residual_variance: f64,
    pub degrees_of_freedom: usize,
}

impl OlsFit {
    pub fn intercept(&self) -> CoefficientEstimate {
        CoefficientEstimate {
            estimate: self.estimates[0],
            std_error: self.std_errors[0],
        }
    }

    /// Coefficient of the `index`-th regressor (0-based, intercept excluded).
    pub fn coefficient(&self, index: usize) -> Option<CoefficientEstimate> {
        let j = index + 1;
        Some(CoefficientEstimate {
            estimate: *self.estimates.get(j)?,
            std_error: *self.std_errors.get(j)?,
        })
    }

    pub fn num_regressors(&self) -> usize {
        self.estimates.len() - 1
    }
}

/// Regress `outcome` on `regressors` with an intercept.
pub fn fit(outcome: &[f64], regressors: &[&[f64]]) -> Result<OlsFit, RegressionError> {
    if regressors.is_empty() {
        return Err(RegressionError::NoRegressors);
    }

    let n = outcome.len();
    for (index, column) in regressors.iter().enumerate() {
        if column.len() != n {
            return Err(RegressionError::LengthMismatch {
                index,
                expected: n,
                actual: column.len(),
            });
        }
    }

    let p = regressors.len() + 1;
    if n <= p {
        return Err(RegressionError::InsufficientObservations {
            observations: n,
            parameters: p,
        });
    }

    let all_finite = outcome.iter().all(|v| v.is_finite())
        && regressors.iter().all(|c| c.iter().all(|v| v.is_finite()));
    if !all_finite {
        return Err(RegressionError::NonFiniteInput);
    }

    let x = DMatrix::from_fn(n, p, |r, c| if c == 0 { 1.0 } else { regressors[c - 1][r] });
    let y = DVector::from_column_slice(outcome);

    let xt = x.transpose();
    let xtx = &xt * &x;
    let xty = &xt * &y;

    let chol = xtx.clone().cholesky().ok_or(RegressionError::SingularDesign)?;
    let l = chol.l();
    for j in 0..p {
        if l[(j, j)].powi(2) <= SINGULAR_TOLERANCE * xtx[(j, j)] {
            return Err(RegressionError::SingularDesign);
        }
    }

    let beta = chol.solve(&xty);
    let residuals = &y - &x * &beta;
    let df = n - p;
    let residual_variance = residuals.norm_squared() / df as f64;

    let xtx_inv = chol.inverse();
    let std_errors = (0..p)
        .map(|j| (residual_variance * xtx_inv[(j, j)]).max(0.0).sqrt())
        .collect();

    Ok(OlsFit {
        estimates: beta.iter().copied().collect(),
        std_errors,
        residual_variance,
        degrees_of_freedom: df,
    })
}
