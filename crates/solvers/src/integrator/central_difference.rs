use ndarray::{Array1, Array2};
use strut_core::{LinearSoe, MatrixSystem, StructuralModel};
use thiserror::Error;

use super::{Error, assemble};

/// Configuration for [`CentralDifference`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Config {
    dt: f64,
    load_factor: f64,
}

/// Errors that can occur when validating a central difference config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("time step must be finite and positive")]
    TimeStep,

    #[error("load factor must be finite")]
    LoadFactor,
}

impl Config {
    /// Creates a config with time step `dt` and a constant load factor.
    ///
    /// # Errors
    ///
    /// Returns an error if `dt` is not positive or either value is
    /// non-finite.
    pub fn new(dt: f64, load_factor: f64) -> Result<Self, ConfigError> {
        let config = Self { dt, load_factor };
        config.validate()?;
        Ok(config)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::TimeStep);
        }
        if !self.load_factor.is_finite() {
            return Err(ConfigError::LoadFactor);
        }
        Ok(())
    }

    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    #[must_use]
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }
}

#[derive(Debug, Clone)]
struct Workspace {
    /// Velocity at the previous half step, `v(n-½)`.
    velocity: Array1<f64>,
    committed_velocity: Array1<f64>,
    delta: Array1<f64>,
    load: Array1<f64>,
}

/// Explicit central-difference time stepping with a lumped mass.
///
/// The "tangent" is the mass matrix, so the solved increment is an
/// acceleration and the update is purely algebraic:
/// `v(n+½) = v(n-½) + Δt a(n)`, `ΔU = Δt v(n+½)`. The first step starts from
/// rest and uses a half step for the velocity. No iteration is needed.
#[derive(Debug, Clone)]
pub struct CentralDifference {
    config: Config,
    steps: usize,
    committed_steps: usize,
    workspace: Option<Workspace>,
}

impl CentralDifference {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            steps: 0,
            committed_steps: 0,
            workspace: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Time at the end of the latest committed step.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.committed_steps as f64 * self.config.dt()
    }

    pub(super) fn initialize(&mut self, num_eqn: usize) {
        self.workspace = Some(Workspace {
            velocity: Array1::zeros(num_eqn),
            committed_velocity: Array1::zeros(num_eqn),
            delta: Array1::zeros(num_eqn),
            load: Array1::zeros(num_eqn),
        });
        self.steps = 0;
        self.committed_steps = 0;
    }

    pub(super) fn new_step(&mut self) -> Result<(), Error> {
        if self.workspace.is_none() {
            return Err(Error::NotInitialized);
        }
        self.config.validate().map_err(Error::invalid_config)?;
        self.steps = self.committed_steps + 1;
        Ok(())
    }

    pub(super) fn form_tangent<M, S>(&mut self, model: &M, sys: &mut S) -> Result<(), Error>
    where
        M: StructuralModel,
        S: MatrixSystem,
    {
        if self.workspace.is_none() {
            return Err(Error::NotInitialized);
        }
        let mass = model.lumped_mass().ok_or(Error::MissingMass)?;

        sys.zero_a();
        for (eq, &m) in mass.iter().enumerate() {
            sys.add_a(&[Some(eq)], Array2::from_elem((1, 1), m).view(), 1.0);
        }
        Ok(())
    }

    pub(super) fn form_unbalance<M, S>(&mut self, model: &M, soe: &mut S) -> Result<(), Error>
    where
        M: StructuralModel,
        S: LinearSoe,
    {
        let ws = self.workspace.as_mut().ok_or(Error::NotInitialized)?;
        assemble::form_unbalance(model, soe, self.config.load_factor(), &mut ws.load)
    }

    pub(super) fn update<M, S>(&mut self, model: &mut M, soe: &mut S) -> Result<(), Error>
    where
        M: StructuralModel,
        S: LinearSoe,
    {
        let ws = self.workspace.as_mut().ok_or(Error::NotInitialized)?;
        let dt = self.config.dt();
        let velocity_dt = if self.steps == 1 { 0.5 * dt } else { dt };

        ws.velocity.scaled_add(velocity_dt, &soe.x());
        ws.delta.assign(&ws.velocity);
        ws.delta *= dt;

        model.incr_disp(ws.delta.view()).map_err(Error::model)?;
        soe.set_x(ws.delta.view());
        Ok(())
    }

    pub(super) fn commit(&mut self) {
        if let Some(ws) = self.workspace.as_mut() {
            ws.committed_velocity.assign(&ws.velocity);
        }
        self.committed_steps = self.steps;
    }

    pub(super) fn revert(&mut self) {
        if let Some(ws) = self.workspace.as_mut() {
            ws.velocity.assign(&ws.committed_velocity);
        }
        self.steps = self.committed_steps;
    }

    pub(super) fn load_factor(&self) -> f64 {
        self.config.load_factor()
    }
}
