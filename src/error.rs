//! Error types for sample generation, regression fitting and rendering.

/// Failures of the least-squares fit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegressionError {
    #[error("regression needs at least one regressor")]
    NoRegressors,

    #[error("regressor {index} has {actual} observations, outcome has {expected}")]
    LengthMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error(
        "{observations} observations leave no residual degrees of freedom \
         for {parameters} parameters"
    )]
    InsufficientObservations {
        observations: usize,
        parameters: usize,
    },

    #[error("design matrix is singular (collinear regressors)")]
    SingularDesign,

    #[error("non-finite value in regression input")]
    NonFiniteInput,
}

/// Crate-level error.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("unknown causal model '{0}' (expected one of: cc, mc, cv)")]
    UnknownCausalModel(String),

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("regression failed: {0}")]
    Regression(#[from] RegressionError),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("plotting failed: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
