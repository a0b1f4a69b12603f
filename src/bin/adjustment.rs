//! Covariate Adjustment Study Binary
//!
//! Simulates each causal model, fits Y ~ X and Y ~ X + Z on every replicate,
//! prints the sampling-distribution summaries and writes the 3x3 figure.
//!
//! ## Usage
//! ```bash
//! cargo run --bin adjustment --release
//! COVARIATE_SIM_LOG=covariate_simulation=debug cargo run --bin adjustment --release
//! ```

use std::error::Error;
use std::path::Path;

use covariate_simulation::causal_model::{CausalModel, PathCoefficients};
use covariate_simulation::logging::init_tracing;
use covariate_simulation::plot::save_study_png;
use covariate_simulation::replication::{run_study, ReplicationConfig};
use tracing::info;

const SAMPLE_SIZE: usize = 100;
const REPLICATES: usize = 10_000;
const WORKERS: usize = 4;
const SEED: u64 = 20_240_101;
const OUTPUT_PATH: &str = "covariate_adjustment.png";

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = ReplicationConfig {
        sample_size: SAMPLE_SIZE,
        replicates: REPLICATES,
        workers: WORKERS,
        seed: SEED,
        coefficients: PathCoefficients::default(),
    };
    let true_effect = config.coefficients.predictor;

    println!("=======================================================");
    println!("  Covariate Adjustment Simulation");
    println!("  When does controlling for Z help?");
    println!("=======================================================");
    println!();
    println!("Parameters:");
    println!("  Sample size:             {}", config.sample_size);
    println!("  Replicates per model:    {}", config.replicates);
    println!("  Workers:                 {}", config.workers);
    println!("  Seed:                    {}", config.seed);
    println!("  Path coefficients:       all {:.1}", true_effect);
    println!();

    let study = run_study(&config)?;

    for collection in study.iter() {
        let model = collection.model;
        println!("=======================================================");
        println!("Causal Model: {} ({})", model.name(), model.tag());
        println!("  {}", model.description());
        println!("=======================================================");
        collection.summary(true_effect).print();
        println!();
    }

    println!("=======================================================");
    println!("  Summary Table");
    println!("=======================================================");
    println!();
    println!("| Model             | Bias Y~X | Bias Y~X+Z | SE Y~X | SE Y~X+Z |");
    println!("|-------------------|----------|------------|--------|----------|");
    for model in CausalModel::all() {
        let s = study.get(model).summary(true_effect);
        println!(
            "| {:17} | {:8.4} | {:10.4} | {:6.4} | {:8.4} |",
            model.name(),
            s.unadjusted.bias,
            s.adjusted.bias,
            s.unadjusted.mean_std_error,
            s.adjusted.mean_std_error,
        );
    }
    println!();

    save_study_png(Path::new(OUTPUT_PATH), &study, true_effect)?;
    info!(path = OUTPUT_PATH, "figure written");
    println!("Figure written to {}", OUTPUT_PATH);

    Ok(())
}
