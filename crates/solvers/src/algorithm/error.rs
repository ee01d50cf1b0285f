use std::error::Error as StdError;

use crate::{convergence, integrator};

/// Errors that can occur while solving a step.
///
/// Every variant maps to a distinct negative status through [`Error::code`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("assembly failed: {0}")]
    Assembly(#[source] integrator::Error),

    #[error("linear solve failed: {0}")]
    LinearSolve(#[source] Box<dyn StdError + Send + Sync>),

    #[error("state update failed: {0}")]
    Update(#[source] integrator::Error),

    #[error("failed to converge after {iters} iterations (norm {norm:e})")]
    NotConverged { iters: usize, norm: f64 },

    #[error("eigen solve failed: {0}")]
    EigenSolve(#[source] Box<dyn StdError + Send + Sync>),

    #[error("convergence test error: {0}")]
    Test(#[from] convergence::Error),
}

impl Error {
    pub(crate) fn linear_solve(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::LinearSolve(Box::new(error))
    }

    pub(crate) fn eigen_solve(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::EigenSolve(Box::new(error))
    }

    /// Legacy numeric status of this error.
    ///
    /// | code | meaning |
    /// |---|---|
    /// | -1 | configuration |
    /// | -2 | assembly |
    /// | -3 | linear solve |
    /// | -4 | state update |
    /// | -5 | convergence failure |
    /// | -6 | eigen solve |
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Test(_) => -1,
            Self::Assembly(_) => -2,
            Self::LinearSolve(_) => -3,
            Self::Update(_) => -4,
            Self::NotConverged { .. } => -5,
            Self::EigenSolve(_) => -6,
        }
    }
}
