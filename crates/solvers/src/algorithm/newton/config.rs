use thiserror::Error;

use super::line_search::LineSearch;

/// When the Newton iteration re-forms the tangent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum TangentUpdate {
    /// Full Newton-Raphson.
    #[default]
    EveryIteration,

    /// Modified Newton: the tangent of the first iteration is reused for the
    /// rest of the step.
    FirstIteration,
}

/// Configuration for [`NewtonRaphson`](super::NewtonRaphson).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Config {
    tangent: TangentUpdate,
    line_search: Option<LineSearch>,
}

/// Errors that can occur when validating a Newton-Raphson config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("line search tolerance must be finite and positive")]
    Tolerance,

    #[error("line search needs at least one iteration")]
    MaxIters,

    #[error("line search bounds must satisfy 0 < min_eta <= 1 <= max_eta")]
    EtaBounds,
}

impl Config {
    /// Creates a config.
    ///
    /// # Errors
    ///
    /// Returns the first invalid line search field found.
    pub fn new(
        tangent: TangentUpdate,
        line_search: Option<LineSearch>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            tangent,
            line_search,
        };
        config.validate()?;
        Ok(config)
    }

    /// Full Newton with the given line search.
    #[must_use]
    pub fn with_line_search(line_search: LineSearch) -> Self {
        Self {
            tangent: TangentUpdate::EveryIteration,
            line_search: Some(line_search),
        }
    }

    /// Modified Newton without line search.
    #[must_use]
    pub fn modified() -> Self {
        Self {
            tangent: TangentUpdate::FirstIteration,
            line_search: None,
        }
    }

    /// Checks the line search settings, if any.
    ///
    /// # Errors
    ///
    /// Returns the first invalid line search field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.line_search.as_ref().map_or(Ok(()), LineSearch::validate)
    }

    #[must_use]
    pub fn tangent(&self) -> TangentUpdate {
        self.tangent
    }

    #[must_use]
    pub fn line_search(&self) -> Option<&LineSearch> {
        self.line_search.as_ref()
    }
}
