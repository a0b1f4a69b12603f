//! Causal Models and Synthetic Samples
//!
//! Three ways of wiring a predictor X, an outcome Y and a covariate Z.
//! Each one answers the question "should Z go into the regression?"
//! differently.
//!
//! ## Models
//! - Case-control: X -> Y -> Z. Z is a consequence of the outcome.
//! - Multiple causes: X -> Y <- Z. Z is an independent cause of the outcome.
//! - Common variance: X -> Y <- u -> Z. Z shares a hidden cause with Y.
//!
//! Every variable carries unit-variance Gaussian noise on top of its
//! structural mean.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{Result, SimulationError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CausalModel {
    CaseControl,    // X -> Y -> Z
    MultipleCauses, // X -> Y <- Z
    CommonVariance, // X -> Y <- u -> Z
}

impl CausalModel {
    pub fn all() -> [Self; 3] {
        [Self::CaseControl, Self::MultipleCauses, Self::CommonVariance]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CaseControl => "Case-control bias",
            Self::MultipleCauses => "Multiple causes",
            Self::CommonVariance => "Common variance",
        }
    }

    /// Short selector: `cc`, `mc` or `cv`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CaseControl => "cc",
            Self::MultipleCauses => "mc",
            Self::CommonVariance => "cv",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::CaseControl => {
                "Z is downstream of Y; adjusting conditions on a consequence"
            }
            Self::MultipleCauses => {
                "Z is an independent cause of Y; adjusting only removes noise"
            }
            Self::CommonVariance => {
                "Z shares a hidden cause with Y; adjusting is unbiased and mildly reduces variance"
            }
        }
    }

    /// Directed edges of the generating graph, used for the diagram panels.
    pub fn edges(&self) -> &'static [(Node, Node)] {
        match self {
            Self::CaseControl => &[
                (Node::Predictor, Node::Outcome),
                (Node::Outcome, Node::Covariate),
            ],
            Self::MultipleCauses => &[
                (Node::Predictor, Node::Outcome),
                (Node::Covariate, Node::Outcome),
            ],
            Self::CommonVariance => &[
                (Node::Predictor, Node::Outcome),
                (Node::Latent, Node::Outcome),
                (Node::Latent, Node::Covariate),
            ],
        }
    }

    /// Nodes drawn in the diagram for this model.
    pub fn nodes(&self) -> &'static [Node] {
        match self {
            Self::CaseControl | Self::MultipleCauses => {
                &[Node::Predictor, Node::Outcome, Node::Covariate]
            }
            Self::CommonVariance => &[
                Node::Predictor,
                Node::Outcome,
                Node::Covariate,
                Node::Latent,
            ],
        }
    }
}

impl fmt::Display for CausalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CausalModel {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "cc" => Ok(Self::CaseControl),
            "mc" => Ok(Self::MultipleCauses),
            "cv" => Ok(Self::CommonVariance),
            other => Err(SimulationError::UnknownCausalModel(other.to_string())),
        }
    }
}

/// A variable in the causal diagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    Predictor,
    Outcome,
    Covariate,
    Latent,
}

impl Node {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Predictor => "X",
            Self::Outcome => "Y",
            Self::Covariate => "Z",
            Self::Latent => "u",
        }
    }

    pub fn is_observed(&self) -> bool {
        !matches!(self, Self::Latent)
    }
}

/// Path weights of the generating model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathCoefficients {
    /// X -> Y
    pub predictor: f64,
    /// Y -> Z under case-control, Z -> Y under multiple causes.
    pub covariate: f64,
    /// u -> Y, common variance only.
    pub latent_outcome: f64,
    /// u -> Z, common variance only.
    pub latent_covariate: f64,
}

impl Default for PathCoefficients {
    fn default() -> Self {
        Self {
            predictor: 1.0,
            covariate: 1.0,
            latent_outcome: 1.0,
            latent_covariate: 1.0,
        }
    }
}

/// One synthetic dataset: three parallel columns of length n.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub predictor: Vec<f64>,
    pub outcome: Vec<f64>,
    pub covariate: Vec<f64>,
}

fn standard_normals(n: usize, rng: &mut impl Rng) -> Vec<f64> {
    (0..n).map(|_| rng.sample::<f64, _>(StandardNormal)).collect()
}

/// Unit-variance normal draws around the given means.
fn normals_around(means: impl Iterator<Item = f64>, rng: &mut impl Rng) -> Vec<f64> {
    means
        .map(|mean| mean + rng.sample::<f64, _>(StandardNormal))
        .collect()
}

/// Draw a sample of size `n` from `model`.
///
/// Columns are drawn whole, in causal order, so a seeded RNG reproduces the
/// sample exactly.
pub fn generate_sample(
    model: CausalModel,
    n: usize,
    coefficients: &PathCoefficients,
    rng: &mut impl Rng,
) -> Result<Sample> {
    if n == 0 {
        return Err(SimulationError::InvalidConfig {
            reason: "sample size must be positive".to_string(),
        });
    }

    let b = coefficients;
    let predictor = standard_normals(n, rng);

    let sample = match model {
        CausalModel::CaseControl => {
            let outcome = normals_around(predictor.iter().map(|x| b.predictor * x), rng);
            let covariate = normals_around(outcome.iter().map(|y| b.covariate * y), rng);
            Sample {
                predictor,
                outcome,
                covariate,
            }
        }
        CausalModel::MultipleCauses => {
            let covariate = standard_normals(n, rng);
            let outcome = normals_around(
                predictor
                    .iter()
                    .zip(&covariate)
                    .map(|(x, z)| b.predictor * x + b.covariate * z),
                rng,
            );
            Sample {
                predictor,
                outcome,
                covariate,
            }
        }
        CausalModel::CommonVariance => {
            let latent = standard_normals(n, rng);
            let covariate = normals_around(latent.iter().map(|u| b.latent_covariate * u), rng);
            let outcome = normals_around(
                predictor
                    .iter()
                    .zip(&latent)
                    .map(|(x, u)| b.predictor * x + b.latent_outcome * u),
                rng,
            );
            Sample {
                predictor,
                outcome,
                covariate,
            }
        }
    };

    Ok(sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn mean(v: &[f64]) -> f64 {
        v.iter().sum::<f64>() / v.len() as f64
    }

    fn covariance(a: &[f64], b: &[f64]) -> f64 {
        let (ma, mb) = (mean(a), mean(b));
        a.iter().zip(b).map(|(x, y)| (x - ma) * (y - mb)).sum::<f64>() / (a.len() - 1) as f64
    }

    fn draw(model: CausalModel, n: usize, coefficients: &PathCoefficients, seed: u64) -> Sample {
        let mut rng = SmallRng::seed_from_u64(seed);
        generate_sample(model, n, coefficients, &mut rng).unwrap()
    }

    #[test]
    fn test_tags_round_trip() {
        for model in CausalModel::all() {
            assert_eq!(model.tag().parse::<CausalModel>().unwrap(), model);
        }
    }

    #[test]
    fn test_unknown_tag_is_an_error() {
        let err = "xx".parse::<CausalModel>().unwrap_err();
        assert!(matches!(err, SimulationError::UnknownCausalModel(ref s) if s == "xx"));
    }

    #[test]
    fn test_sample_lengths() {
        for model in CausalModel::all() {
            let sample = draw(model, 100, &PathCoefficients::default(), 42);
            assert_eq!(sample.predictor.len(), 100);
            assert_eq!(sample.outcome.len(), 100);
            assert_eq!(sample.covariate.len(), 100);
        }
    }

    #[test]
    fn test_zero_sample_size_rejected() {
        let mut rng = SmallRng::seed_from_u64(42);
        let coefficients = PathCoefficients::default();
        let result = generate_sample(CausalModel::CaseControl, 0, &coefficients, &mut rng);
        assert!(matches!(result, Err(SimulationError::InvalidConfig { .. })));
    }

    #[test]
    fn test_sample_deterministic() {
        for model in CausalModel::all() {
            let a = draw(model, 50, &PathCoefficients::default(), 123);
            let b = draw(model, 50, &PathCoefficients::default(), 123);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_multiple_causes_covariate_independent_of_predictor() {
        let s = draw(CausalModel::MultipleCauses, 20_000, &PathCoefficients::default(), 7);
        assert!(covariance(&s.predictor, &s.covariate).abs() < 0.05);
        // Var(Y) = 1 + 1 + 1
        assert!((covariance(&s.outcome, &s.outcome) - 3.0).abs() < 0.15);
    }

    #[test]
    fn test_case_control_covariate_follows_outcome() {
        let coefficients = PathCoefficients {
            covariate: 2.0,
            ..PathCoefficients::default()
        };
        let s = draw(CausalModel::CaseControl, 20_000, &coefficients, 7);
        // Cov(Y, Z) = 2 Var(Y) = 4
        assert!((covariance(&s.outcome, &s.covariate) - 4.0).abs() < 0.25);
    }

    #[test]
    fn test_common_variance_links_only_through_latent() {
        let s = draw(CausalModel::CommonVariance, 20_000, &PathCoefficients::default(), 7);
        assert!(covariance(&s.predictor, &s.covariate).abs() < 0.05);
        // Cov(Y, Z) = Var(u) = 1
        assert!((covariance(&s.outcome, &s.covariate) - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_common_variance_uses_latent_weights_only() {
        let coefficients = PathCoefficients {
            latent_outcome: 2.0,
            latent_covariate: 3.0,
            ..PathCoefficients::default()
        };
        let s = draw(CausalModel::CommonVariance, 20_000, &coefficients, 7);
        // Cov(Y, Z) = 2 * 3 * Var(u) = 6, Var(Z) = 9 + 1
        assert!((covariance(&s.outcome, &s.covariate) - 6.0).abs() < 0.3);
        assert!((covariance(&s.covariate, &s.covariate) - 10.0).abs() < 0.4);

        // the Z / Y weight has no path in this model
        let ignored = PathCoefficients {
            covariate: 5.0,
            ..coefficients
        };
        assert_eq!(s, draw(CausalModel::CommonVariance, 20_000, &ignored, 7));
    }

    #[test]
    fn test_latent_node_only_in_common_variance() {
        assert!(!CausalModel::CaseControl.nodes().contains(&Node::Latent));
        assert!(!CausalModel::MultipleCauses.nodes().contains(&Node::Latent));
        assert!(CausalModel::CommonVariance.nodes().contains(&Node::Latent));
        for model in CausalModel::all() {
            for (from, to) in model.edges() {
                assert!(model.nodes().contains(from));
                assert!(model.nodes().contains(to));
            }
        }
    }
}
