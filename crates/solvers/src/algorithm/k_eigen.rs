//! Ill-conditioning detector based on the eigenvalues of the tangent.
//!
//! Instead of iterating, the detector forms the tangent `K`, estimates its
//! reciprocal condition number, and only when that falls below
//! `1 / cond_number_threshold` solves the standard eigenproblem `K x = σ x`
//! for the smallest-magnitude eigenvalues. Each `σ` is reported as the load
//! multiplier `λ = 1 / (1 - σ)`, and the eigen-pairs are pushed to the model.
//!
//! Eigen analysis is expensive, so a well-conditioned tangent costs only the
//! condition estimate.

use ndarray::Array2;
use strut_core::{EigenPair, EigenSoe, StructuralModel, Which};
use thiserror::Error;

use crate::integrator::Integrator;

use super::Error;

/// Load multiplier reported for `σ = 1`.
pub const SINGULAR_MULTIPLIER: f64 = 1e99;

/// Configuration for [`KEigen`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Config {
    cond_number_threshold: f64,
    num_modes: usize,
}

/// Errors that can occur when validating a detector config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("condition number threshold must be finite and at least 1")]
    Threshold,

    #[error("at least one mode must be requested")]
    NumModes,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cond_number_threshold: 1e5,
            num_modes: 1,
        }
    }
}

impl Config {
    /// Creates a config.
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold is below 1 or non-finite, or if
    /// `num_modes` is zero.
    pub fn new(cond_number_threshold: f64, num_modes: usize) -> Result<Self, ConfigError> {
        let config = Self {
            cond_number_threshold,
            num_modes,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cond_number_threshold.is_finite() || self.cond_number_threshold < 1.0 {
            return Err(ConfigError::Threshold);
        }
        if self.num_modes == 0 {
            return Err(ConfigError::NumModes);
        }
        Ok(())
    }

    #[must_use]
    pub fn cond_number_threshold(&self) -> f64 {
        self.cond_number_threshold
    }

    #[must_use]
    pub fn num_modes(&self) -> usize {
        self.num_modes
    }
}

/// What the detector found for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Reciprocal condition number estimate of the tangent.
    pub rcond: f64,

    /// Whether the eigen analysis ran.
    pub triggered: bool,

    /// Eigen-pairs found, empty unless triggered.
    pub modes: Vec<EigenPair>,
}

/// Ill-conditioning eigen detector.
#[derive(Debug, Clone, Default)]
pub struct KEigen {
    config: Config,
}

impl KEigen {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Checks the tangent at the trial state and, if ill-conditioned, solves
    /// for its smallest eigenvalues.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] without an eigen system or with an invalid
    /// configuration, [`Error::Assembly`] if the tangent cannot be formed,
    /// and [`Error::EigenSolve`] if the eigen system fails.
    pub fn solve_step<M, E>(
        &self,
        step: usize,
        model: &mut M,
        integrator: &mut Integrator,
        eigen: Option<&mut E>,
    ) -> Result<Report, Error>
    where
        M: StructuralModel,
        E: EigenSoe,
    {
        self.config
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        let eigen = eigen.ok_or_else(|| {
            Error::Config("ill-conditioning detector requires an eigen system".into())
        })?;

        let n = model.num_eqn();
        if eigen.num_eqn() != n {
            return Err(Error::Config(format!(
                "eigen system has {} equations but the model has {n}",
                eigen.num_eqn()
            )));
        }

        integrator
            .form_tangent(model, eigen)
            .map_err(Error::Assembly)?;

        eigen.zero_m();
        let unit = Array2::from_elem((1, 1), 1.0);
        for eq in 0..n {
            eigen.add_m(&[Some(eq)], unit.view(), 1.0);
        }

        let rcond = eigen.rcond().map_err(Error::eigen_solve)?;
        if rcond >= 1.0 / self.config.cond_number_threshold() {
            log::debug!("step {step}: tangent well conditioned (rcond = {rcond:e})");
            return Ok(Report {
                rcond,
                triggered: false,
                modes: Vec::new(),
            });
        }

        log::warn!("step {step}: ill-conditioned tangent (rcond = {rcond:e})");

        let num_modes = self.config.num_modes().min(n);
        eigen
            .solve(num_modes, Which::SmallestMagnitude)
            .map_err(Error::eigen_solve)?;

        let modes: Vec<EigenPair> = (0..eigen.num_modes())
            .map(|i| {
                let sigma = eigen.eigenvalue(i);
                EigenPair {
                    sigma,
                    value: load_multiplier(sigma),
                    vector: eigen.eigenvector(i).to_owned(),
                }
            })
            .collect();

        for (i, mode) in modes.iter().enumerate() {
            log::info!("step {step}: mode {i}: σ = {:e}, λ = {:e}", mode.sigma, mode.value);
        }
        model.set_eigen_pairs(&modes);

        Ok(Report {
            rcond,
            triggered: true,
            modes,
        })
    }
}

/// Maps an eigenvalue of the tangent to the load multiplier `1 / (1 - σ)`.
#[must_use]
pub fn load_multiplier(sigma: f64) -> f64 {
    if sigma == 1.0 {
        SINGULAR_MULTIPLIER
    } else {
        1.0 / (1.0 - sigma)
    }
}
