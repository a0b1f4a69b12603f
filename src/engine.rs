//! Simulation-and-Fit Engine
//!
//! One replicate: draw a sample from a causal model, then regress Y on X
//! alone and Y on X and Z jointly. Both fits read the same sample.

use rand::Rng;

use crate::causal_model::{generate_sample, CausalModel, PathCoefficients, Sample};
use crate::error::{RegressionError, Result};
use crate::ols::{self, CoefficientEstimate};

pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// Per-replicate inputs besides the model selector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineParams {
    pub sample_size: usize,
    pub coefficients: PathCoefficients,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            coefficients: PathCoefficients::default(),
        }
    }
}

/// The X coefficient under both specifications.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplicateResult {
    /// Y ~ X
    pub unadjusted: CoefficientEstimate,
    /// Y ~ X + Z
    pub adjusted: CoefficientEstimate,
}

/// Fit both specifications on an existing sample.
pub fn fit_sample(sample: &Sample) -> Result<ReplicateResult> {
    let simple = ols::fit(&sample.outcome, &[sample.predictor.as_slice()])?;
    let joint = ols::fit(
        &sample.outcome,
        &[sample.predictor.as_slice(), sample.covariate.as_slice()],
    )?;

    let unadjusted = simple.coefficient(0).ok_or(RegressionError::NoRegressors)?;
    let adjusted = joint.coefficient(0).ok_or(RegressionError::NoRegressors)?;

    Ok(ReplicateResult {
        unadjusted,
        adjusted,
    })
}

/// Generate one sample and fit both regressions on it.
pub fn simulate_replicate(
    model: CausalModel,
    params: &EngineParams,
    rng: &mut impl Rng,
) -> Result<ReplicateResult> {
    let sample = generate_sample(model, params.sample_size, &params.coefficients, rng)?;
    fit_sample(&sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use crate::error::SimulationError;
    use rand::SeedableRng;

    #[test]
    fn test_replicate_matches_fits_on_same_sample() {
        let params = EngineParams::default();
        for model in CausalModel::all() {
            let mut rng1 = SmallRng::seed_from_u64(99);
            let mut rng2 = SmallRng::seed_from_u64(99);

            let result = simulate_replicate(model, &params, &mut rng1).unwrap();
            let sample = generate_sample(
                model,
                params.sample_size,
                &params.coefficients,
                &mut rng2,
            )
            .unwrap();

            let simple = ols::fit(&sample.outcome, &[sample.predictor.as_slice()]).unwrap();
            let joint = ols::fit(
                &sample.outcome,
                &[sample.predictor.as_slice(), sample.covariate.as_slice()],
            )
            .unwrap();
            assert_eq!(result.unadjusted, simple.coefficient(0).unwrap());
            assert_eq!(result.adjusted, joint.coefficient(0).unwrap());
        }
    }

    #[test]
    fn test_replicate_deterministic() {
        let params = EngineParams::default();
        let mut rng1 = SmallRng::seed_from_u64(5);
        let mut rng2 = SmallRng::seed_from_u64(5);
        let a = simulate_replicate(CausalModel::CommonVariance, &params, &mut rng1).unwrap();
        let b = simulate_replicate(CausalModel::CommonVariance, &params, &mut rng2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_standard_errors_positive() {
        let params = EngineParams::default();
        let mut rng = SmallRng::seed_from_u64(11);
        for model in CausalModel::all() {
            let r = simulate_replicate(model, &params, &mut rng).unwrap();
            assert!(r.unadjusted.std_error > 0.0);
            assert!(r.adjusted.std_error > 0.0);
        }
    }

    #[test]
    fn test_sample_too_small_for_joint_fit() {
        let params = EngineParams {
            sample_size: 3,
            ..EngineParams::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let err = simulate_replicate(CausalModel::MultipleCauses, &params, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Regression(RegressionError::InsufficientObservations { .. })
        ));
    }
}
