//! Covariate Adjustment Simulation Library
//!
//! Monte Carlo study of when "controlling for" a covariate Z helps or hurts
//! the regression estimate of a predictor X's effect on an outcome Y. The
//! answer depends on how the three variables are causally wired.
//!
//! ## Modules
//!
//! - `causal_model`: the three generating models and sample generation
//! - `ols`: least-squares fits with standard errors
//! - `engine`: one replicate, simple and adjusted fits on the same sample
//! - `replication`: seeded parallel replicates and per-model summaries
//! - `density`: kernel density estimates for the sampling distributions
//! - `plot`: 3x3 figure of causal diagrams and density overlays
//!
//! ## Usage
//!
//! ```bash
//! # Run the full study (10,000 replicates per model) and write the figure
//! cargo run --bin adjustment --release
//! ```

pub mod causal_model;
pub mod density;
pub mod engine;
pub mod error;
pub mod logging;
pub mod ols;
pub mod plot;
pub mod replication;

pub use error::{RegressionError, Result, SimulationError};
