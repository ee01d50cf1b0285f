use crate::{algorithm, integrator};

/// Errors that can occur while running an analysis.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("analysis is missing its {0}")]
    MissingComponent(&'static str),

    #[error("model has {model} equations but the {system} has {found}")]
    SizeMismatch {
        system: &'static str,
        model: usize,
        found: usize,
    },

    #[error("step {step}: predictor failed: {source}")]
    NewStep {
        step: usize,
        #[source]
        source: integrator::Error,
    },

    #[error("step {step}: {source}")]
    Step {
        step: usize,
        #[source]
        source: algorithm::Error,
    },

    #[error("step {step}: commit failed: {source}")]
    Commit {
        step: usize,
        #[source]
        source: integrator::Error,
    },
}

impl Error {
    /// Legacy numeric status, matching [`algorithm::Error::code`] for step
    /// failures.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::MissingComponent(_) | Self::SizeMismatch { .. } => -1,
            Self::NewStep {
                source: integrator::Error::InvalidConfig(_),
                ..
            } => -1,
            Self::NewStep { .. } => -2,
            Self::Step { source, .. } => source.code(),
            Self::Commit { .. } => -4,
        }
    }

    /// Step at which the analysis stopped, if it got that far.
    #[must_use]
    pub fn step(&self) -> Option<usize> {
        match self {
            Self::MissingComponent(_) | Self::SizeMismatch { .. } => None,
            Self::NewStep { step, .. } | Self::Step { step, .. } | Self::Commit { step, .. } => {
                Some(*step)
            }
        }
    }
}
