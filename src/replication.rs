//! Replication Driver
//!
//! Runs the engine many times per causal model on a fixed-size worker pool
//! and collects the results into one collection per model.
//!
//! ## Random streams
//! Every replicate gets its own `SmallRng`, seeded from the study seed, the
//! model and the replicate index. Streams never depend on which worker
//! picks up a replicate, so a study is reproducible for any pool size.

use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::causal_model::{CausalModel, PathCoefficients};
use crate::engine::{simulate_replicate, EngineParams, ReplicateResult, DEFAULT_SAMPLE_SIZE};
use crate::error::{Result, SimulationError};
use crate::ols::CoefficientEstimate;

pub const DEFAULT_REPLICATES: usize = 10_000;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_SEED: u64 = 20_240_101;

/// Normal quantile for the 95% interval coverage check.
const Z_95: f64 = 1.959_963_984_540_054;

/// Smallest sample that leaves residual degrees of freedom for Y ~ X + Z.
const MIN_SAMPLE_SIZE: usize = 4;

#[derive(Clone, Debug)]
pub struct ReplicationConfig {
    pub sample_size: usize,
    pub replicates: usize,
    pub workers: usize,
    pub seed: u64,
    pub coefficients: PathCoefficients,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            replicates: DEFAULT_REPLICATES,
            workers: DEFAULT_WORKERS,
            seed: DEFAULT_SEED,
            coefficients: PathCoefficients::default(),
        }
    }
}

impl ReplicationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.replicates == 0 {
            return Err(invalid("replicates must be positive"));
        }
        if self.workers == 0 {
            return Err(invalid("workers must be positive"));
        }
        if self.sample_size < MIN_SAMPLE_SIZE {
            return Err(invalid(format!(
                "sample size {} is below the minimum of {} for the adjusted fit",
                self.sample_size, MIN_SAMPLE_SIZE
            )));
        }
        Ok(())
    }

    fn engine_params(&self) -> EngineParams {
        EngineParams {
            sample_size: self.sample_size,
            coefficients: self.coefficients,
        }
    }
}

fn invalid(reason: impl Into<String>) -> SimulationError {
    SimulationError::InvalidConfig {
        reason: reason.into(),
    }
}

fn model_index(model: CausalModel) -> u64 {
    match model {
        CausalModel::CaseControl => 0,
        CausalModel::MultipleCauses => 1,
        CausalModel::CommonVariance => 2,
    }
}

/// Seed of replicate `index` of `model`.
pub fn replicate_seed(seed: u64, model: CausalModel, index: usize) -> u64 {
    seed.wrapping_add(model_index(model) << 32)
        .wrapping_add(index as u64)
}

/// All replicates of one causal model, in replicate order.
#[derive(Clone, Debug)]
pub struct ReplicateCollection {
    pub model: CausalModel,
    pub results: Vec<ReplicateResult>,
}

impl ReplicateCollection {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn unadjusted_estimates(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.unadjusted.estimate).collect()
    }

    pub fn adjusted_estimates(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.adjusted.estimate).collect()
    }

    pub fn unadjusted_std_errors(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.unadjusted.std_error).collect()
    }

    pub fn adjusted_std_errors(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.adjusted.std_error).collect()
    }

    pub fn summary(&self, true_effect: f64) -> ModelSummary {
        ModelSummary {
            model: self.model,
            replicates: self.len(),
            true_effect,
            unadjusted: SpecificationSummary::from_estimates(
                self.results.iter().map(|r| r.unadjusted),
                true_effect,
            ),
            adjusted: SpecificationSummary::from_estimates(
                self.results.iter().map(|r| r.adjusted),
                true_effect,
            ),
        }
    }
}

/// Sampling distribution of the X coefficient under one specification.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpecificationSummary {
    pub mean_estimate: f64,
    pub bias: f64,
    pub sd_estimate: f64,
    pub mean_std_error: f64,
    pub coverage_95: f64,
}

impl SpecificationSummary {
    fn from_estimates(
        estimates: impl Iterator<Item = CoefficientEstimate> + Clone,
        true_effect: f64,
    ) -> Self {
        let n = estimates.clone().count();
        if n == 0 {
            return Self::default();
        }
        let n_f = n as f64;

        let mean_estimate = estimates.clone().map(|c| c.estimate).sum::<f64>() / n_f;
        let variance = if n > 1 {
            estimates
                .clone()
                .map(|c| (c.estimate - mean_estimate).powi(2))
                .sum::<f64>()
                / (n_f - 1.0)
        } else {
            0.0
        };
        let mean_std_error = estimates.clone().map(|c| c.std_error).sum::<f64>() / n_f;
        let covered = estimates.filter(|c| c.covers(true_effect, Z_95)).count();

        Self {
            mean_estimate,
            bias: mean_estimate - true_effect,
            sd_estimate: variance.sqrt(),
            mean_std_error,
            coverage_95: covered as f64 / n_f,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ModelSummary {
    pub model: CausalModel,
    pub replicates: usize,
    pub true_effect: f64,
    pub unadjusted: SpecificationSummary,
    pub adjusted: SpecificationSummary,
}

impl ModelSummary {
    pub fn print(&self) {
        println!("  Replicates:              {}", self.replicates);
        println!("  True effect of X:        {:.3}", self.true_effect);
        println!("                           {:>10} {:>10}", "Y ~ X", "Y ~ X + Z");
        println!(
            "  Mean estimate:           {:>10.4} {:>10.4}",
            self.unadjusted.mean_estimate, self.adjusted.mean_estimate
        );
        println!(
            "  Bias:                    {:>10.4} {:>10.4}",
            self.unadjusted.bias, self.adjusted.bias
        );
        println!(
            "  SD of estimates:         {:>10.4} {:>10.4}",
            self.unadjusted.sd_estimate, self.adjusted.sd_estimate
        );
        println!(
            "  Mean standard error:     {:>10.4} {:>10.4}",
            self.unadjusted.mean_std_error, self.adjusted.mean_std_error
        );
        println!(
            "  95% CI coverage:         {:>9.1}% {:>9.1}%",
            self.unadjusted.coverage_95 * 100.0,
            self.adjusted.coverage_95 * 100.0
        );
    }
}

/// One collection per causal model.
#[derive(Clone, Debug)]
pub struct StudyResults {
    pub case_control: ReplicateCollection,
    pub multiple_causes: ReplicateCollection,
    pub common_variance: ReplicateCollection,
}

impl StudyResults {
    pub fn get(&self, model: CausalModel) -> &ReplicateCollection {
        match model {
            CausalModel::CaseControl => &self.case_control,
            CausalModel::MultipleCauses => &self.multiple_causes,
            CausalModel::CommonVariance => &self.common_variance,
        }
    }

    /// Collections in `CausalModel::all()` order.
    pub fn iter(&self) -> impl Iterator<Item = &ReplicateCollection> {
        CausalModel::all().into_iter().map(move |m| self.get(m))
    }
}

fn build_pool(workers: usize) -> Result<rayon::ThreadPool> {
    Ok(rayon::ThreadPoolBuilder::new().num_threads(workers).build()?)
}

fn collect_replicates(
    model: CausalModel,
    config: &ReplicationConfig,
    pool: &rayon::ThreadPool,
) -> Result<ReplicateCollection> {
    let params = config.engine_params();
    let start = Instant::now();

    let results = pool.install(|| {
        (0..config.replicates)
            .into_par_iter()
            .map(|i| {
                let mut rng = SmallRng::seed_from_u64(replicate_seed(config.seed, model, i));
                simulate_replicate(model, &params, &mut rng)
            })
            .collect::<Result<Vec<_>>>()
    })?;

    info!(
        model = model.tag(),
        replicates = results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "collected replicates"
    );

    Ok(ReplicateCollection { model, results })
}

/// Run `config.replicates` replicates of a single causal model.
pub fn run_model(model: CausalModel, config: &ReplicationConfig) -> Result<ReplicateCollection> {
    config.validate()?;
    let pool = build_pool(config.workers)?;
    collect_replicates(model, config, &pool)
}

/// Run every causal model with the same configuration.
pub fn run_study(config: &ReplicationConfig) -> Result<StudyResults> {
    config.validate()?;
    debug!(?config, "starting study");
    let pool = build_pool(config.workers)?;

    Ok(StudyResults {
        case_control: collect_replicates(CausalModel::CaseControl, config, &pool)?,
        multiple_causes: collect_replicates(CausalModel::MultipleCauses, config, &pool)?,
        common_variance: collect_replicates(CausalModel::CommonVariance, config, &pool)?,
    })
}
