use ndarray::{Array1, ArrayView1};
use strut_core::{LinearSoe, StructuralModel};
use thiserror::Error;

use super::{Error, assemble};

/// Configuration for [`LoadControl`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Config {
    increment: f64,
    desired_iters: usize,
    min_increment: f64,
    max_increment: f64,
}

/// Errors that can occur when validating a load control config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("load increment must be finite")]
    Increment,

    #[error("desired iterations per step must be at least 1")]
    DesiredIters,

    #[error("increment bounds must be finite with min <= max")]
    Bounds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            increment: 0.1,
            desired_iters: 1,
            min_increment: 0.1,
            max_increment: 0.1,
        }
    }
}

impl Config {
    /// Creates a config.
    ///
    /// `desired_iters` is the iteration count a step should take; steps that
    /// take fewer grow the next increment, steps that take more shrink it,
    /// always within `[min_increment, max_increment]`.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is non-finite, `desired_iters` is zero, or
    /// `min_increment > max_increment`.
    pub fn new(
        increment: f64,
        desired_iters: usize,
        min_increment: f64,
        max_increment: f64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            increment,
            desired_iters,
            min_increment,
            max_increment,
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a config with a constant increment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Increment`] if `increment` is not finite.
    pub fn constant(increment: f64) -> Result<Self, ConfigError> {
        Self::new(increment, 1, increment, increment)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.increment.is_finite() {
            return Err(ConfigError::Increment);
        }
        if self.desired_iters == 0 {
            return Err(ConfigError::DesiredIters);
        }
        if !self.min_increment.is_finite()
            || !self.max_increment.is_finite()
            || self.min_increment > self.max_increment
        {
            return Err(ConfigError::Bounds);
        }
        Ok(())
    }

    #[must_use]
    pub fn increment(&self) -> f64 {
        self.increment
    }

    #[must_use]
    pub fn desired_iters(&self) -> usize {
        self.desired_iters
    }

    #[must_use]
    pub fn min_increment(&self) -> f64 {
        self.min_increment
    }

    #[must_use]
    pub fn max_increment(&self) -> f64 {
        self.max_increment
    }
}

/// Advances the load factor by an adaptive increment.
///
/// The increment of each step is the previous increment scaled by
/// `desired_iters / iters_last_step` and clamped to the configured bounds.
/// A step with no recorded iterations leaves the increment unscaled.
#[derive(Debug, Clone)]
pub struct LoadControl {
    config: Config,
    increment: f64,
    lambda: f64,
    committed_lambda: f64,
    iters_this_step: usize,
    load: Option<Array1<f64>>,
}

impl LoadControl {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            increment: config.increment(),
            lambda: 0.0,
            committed_lambda: 0.0,
            iters_this_step: config.desired_iters(),
            load: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load increment applied by the latest step.
    #[must_use]
    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Number of updates applied in the current step.
    #[must_use]
    pub fn iters_this_step(&self) -> usize {
        self.iters_this_step
    }

    pub(super) fn initialize(&mut self, num_eqn: usize) {
        self.load = Some(Array1::zeros(num_eqn));
    }

    pub(super) fn new_step(&mut self) -> Result<(), Error> {
        if self.load.is_none() {
            return Err(Error::NotInitialized);
        }
        self.config.validate().map_err(Error::invalid_config)?;

        let factor = match self.iters_this_step {
            0 => 1.0,
            n => self.config.desired_iters() as f64 / n as f64,
        };
        self.increment = (self.increment * factor)
            .clamp(self.config.min_increment(), self.config.max_increment());
        self.iters_this_step = 0;
        self.lambda += self.increment;

        log::debug!("load control: λ = {} (Δλ = {})", self.lambda, self.increment);
        Ok(())
    }

    pub(crate) fn form_unbalance<M, S>(&mut self, model: &M, soe: &mut S) -> Result<(), Error>
    where
        M: StructuralModel,
        S: LinearSoe,
    {
        let load = self.load.as_mut().ok_or(Error::NotInitialized)?;
        assemble::form_unbalance(model, soe, self.lambda, load)
    }

    pub(crate) fn update<M, S>(&mut self, model: &mut M, soe: &S) -> Result<(), Error>
    where
        M: StructuralModel,
        S: LinearSoe,
    {
        if self.load.is_none() {
            return Err(Error::NotInitialized);
        }
        model.incr_disp(soe.x()).map_err(Error::model)?;
        self.iters_this_step += 1;
        Ok(())
    }

    /// Moves the trial state by `delta` without counting an iteration.
    ///
    /// Line searches use this to try scaled versions of a Newton step.
    pub(crate) fn shift_trial<M>(
        &mut self,
        model: &mut M,
        delta: ArrayView1<'_, f64>,
    ) -> Result<(), Error>
    where
        M: StructuralModel,
    {
        model.incr_disp(delta).map_err(Error::model)
    }

    pub(super) fn commit(&mut self) {
        self.committed_lambda = self.lambda;
    }

    pub(super) fn revert(&mut self) {
        self.lambda = self.committed_lambda;
    }

    pub(super) fn load_factor(&self) -> f64 {
        self.lambda
    }
}
