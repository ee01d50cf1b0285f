use thiserror::Error;

use super::Norm;

/// The scalar metric a convergence test compares against its tolerance.
///
/// `ΔU` is the solved increment left in the system's `X`, `R` the unbalance
/// left in `B`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Kind {
    /// `‖ΔU‖`.
    NormDispIncr,

    /// `‖R‖`.
    NormUnbalance,

    /// `½ |ΔU · R|`.
    EnergyIncr,

    /// `‖ΔU‖` over its first-iteration value.
    RelativeNormDispIncr,

    /// `‖R‖` over its first-iteration value.
    RelativeNormUnbalance,

    /// `½ |ΔU · R|` over its first-iteration value.
    RelativeEnergyIncr,

    /// `‖ΔU‖` over the sum of `‖ΔU‖` across the step so far.
    RelativeTotalNormDispIncr,

    /// Both `‖ΔU‖ ≤ tolerance` and `‖R‖ ≤ unbalance_tol`.
    NormDispAndUnbalance { unbalance_tol: f64 },

    /// Either `‖ΔU‖ ≤ tolerance` or `‖R‖ ≤ unbalance_tol`.
    NormDispOrUnbalance { unbalance_tol: f64 },

    /// Always runs `max_iters` iterations and then reports success.
    FixedNumIter,
}

/// How much a convergence test writes to the log.
///
/// Verbosity never changes a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Verbosity {
    #[default]
    Silent,

    /// Log the metric at every test.
    EachIteration,

    /// Log only when the test converges.
    OnSuccess,

    /// Log every test along with the norms of `ΔU` and `R`.
    Detailed,
}

/// Configuration for a [`ConvergenceTest`](super::ConvergenceTest).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Config {
    kind: Kind,
    tolerance: f64,
    max_iters: usize,
    norm: Norm,
    verbosity: Verbosity,
}

/// Errors that can occur when validating a convergence test config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tolerance must be finite and non-negative")]
    Tolerance,

    #[error("unbalance tolerance must be finite and non-negative")]
    UnbalanceTolerance,

    #[error("max_iters must be at least 1")]
    MaxIters,

    #[error("norm order must be finite and at least 1")]
    NormOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: Kind::NormUnbalance,
            tolerance: 1e-8,
            max_iters: 25,
            norm: Norm::default(),
            verbosity: Verbosity::Silent,
        }
    }
}

impl Config {
    /// Creates a config using the Euclidean norm and no logging.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance is negative or non-finite, or if
    /// `max_iters` is zero.
    pub fn new(kind: Kind, tolerance: f64, max_iters: usize) -> Result<Self, ConfigError> {
        let config = Self {
            kind,
            tolerance,
            max_iters,
            norm: Norm::default(),
            verbosity: Verbosity::Silent,
        };
        config.validate()?;
        Ok(config)
    }

    /// Replaces the vector norm.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NormOrder`] for a `p`-norm with `p < 1`.
    pub fn with_norm(self, norm: Norm) -> Result<Self, ConfigError> {
        let config = Self { norm, ..self };
        config.validate()?;
        Ok(config)
    }

    /// Replaces the logging verbosity.
    #[must_use]
    pub fn with_verbosity(self, verbosity: Verbosity) -> Self {
        Self { verbosity, ..self }
    }

    /// Checks every field.
    ///
    /// Configs built with [`Config::new`] are always valid; this is for
    /// configs that arrive through deserialization.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::Tolerance);
        }
        if let Kind::NormDispAndUnbalance { unbalance_tol }
        | Kind::NormDispOrUnbalance { unbalance_tol } = self.kind
        {
            if !unbalance_tol.is_finite() || unbalance_tol < 0.0 {
                return Err(ConfigError::UnbalanceTolerance);
            }
        }
        if self.max_iters == 0 {
            return Err(ConfigError::MaxIters);
        }
        if let Norm::P(p) = self.norm {
            if !p.is_finite() || p < 1.0 {
                return Err(ConfigError::NormOrder);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    #[must_use]
    pub fn norm(&self) -> Norm {
        self.norm
    }

    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}
