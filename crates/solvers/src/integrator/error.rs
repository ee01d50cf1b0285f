use std::error::Error as StdError;

/// Errors that can occur inside an integrator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("integrator used before initialize()")]
    NotInitialized,

    #[error("invalid integrator config: {0}")]
    InvalidConfig(#[source] Box<dyn StdError + Send + Sync>),

    #[error("model has {model} equations but the system of equations has {soe}")]
    SizeMismatch { model: usize, soe: usize },

    #[error("explicit integration requires a lumped mass")]
    MissingMass,

    #[error("arc-length constraint has complex roots (discriminant {discriminant:e})")]
    ComplexRoots { discriminant: f64 },

    #[error("arc-length constraint is degenerate: zero denominator")]
    ZeroDenominator,

    #[error("model error: {0}")]
    Model(#[source] Box<dyn StdError + Send + Sync>),

    #[error("linear solve failed: {0}")]
    LinearSolve(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn invalid_config(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::InvalidConfig(Box::new(error))
    }

    pub(crate) fn model(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Model(Box::new(error))
    }

    pub(crate) fn linear_solve(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::LinearSolve(Box::new(error))
    }
}
