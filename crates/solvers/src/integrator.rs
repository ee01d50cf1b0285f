//! Integrators: how the control parameter evolves and how the system is
//! populated and the trial state updated.
//!
//! An [`Integrator`] owns the load factor `λ`. Each step it advances the
//! control parameter and applies a predictor ([`Integrator::new_step`]), then
//! for every Newton iteration it assembles the tangent and the unbalance
//! `R = λ P - F_int` into the system of equations and applies the solved
//! increment back to the model ([`Integrator::update`]). A converged step is
//! made permanent with [`Integrator::commit`].
//!
//! # Variants
//!
//! - [`LoadControl`]: prescribed, adaptively sized load increments
//! - [`ArcLength`]: load factor solved from an arc-length constraint, able to
//!   pass limit points
//! - [`CentralDifference`]: explicit dynamics with a lumped mass; a single
//!   pass per step with no iteration
//!
//! The trial state moves only through these methods. Between `commit` calls it
//! can be rolled back with [`Integrator::revert`].

pub mod arc_length;
pub mod central_difference;
pub mod load_control;

mod assemble;
mod error;

#[cfg(test)]
mod tests;

pub use arc_length::ArcLength;
pub use central_difference::CentralDifference;
pub use error::Error;
pub use load_control::LoadControl;

use std::fmt;

use strut_core::{LinearSoe, MatrixSystem, StructuralModel};

/// The integrators the solution algorithms can drive.
#[derive(Debug, Clone)]
pub enum Integrator {
    LoadControl(LoadControl),
    ArcLength(ArcLength),
    CentralDifference(CentralDifference),
}

impl From<LoadControl> for Integrator {
    fn from(integrator: LoadControl) -> Self {
        Self::LoadControl(integrator)
    }
}

impl From<ArcLength> for Integrator {
    fn from(integrator: ArcLength) -> Self {
        Self::ArcLength(integrator)
    }
}

impl From<CentralDifference> for Integrator {
    fn from(integrator: CentralDifference) -> Self {
        Self::CentralDifference(integrator)
    }
}

impl Integrator {
    /// Sizes per-instance buffers for `model`.
    ///
    /// Must be called before any other operation, and again whenever the
    /// model's equation count changes.
    pub fn initialize<M: StructuralModel>(&mut self, model: &M) {
        let num_eqn = model.num_eqn();
        match self {
            Self::LoadControl(i) => i.initialize(num_eqn),
            Self::ArcLength(i) => i.initialize(num_eqn),
            Self::CentralDifference(i) => i.initialize(num_eqn),
        }
    }

    /// Advances the control parameter and applies the step predictor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before [`initialize`](Self::initialize),
    /// [`Error::SizeMismatch`] if `soe` does not match the model, or any
    /// model or linear-solve failure of the predictor.
    pub fn new_step<M, S>(&mut self, model: &mut M, soe: &mut S) -> Result<(), Error>
    where
        M: StructuralModel,
        S: LinearSoe,
    {
        check_size(model, soe)?;
        match self {
            Self::LoadControl(i) => i.new_step(),
            Self::ArcLength(i) => i.new_step(model, soe),
            Self::CentralDifference(i) => i.new_step(),
        }
    }

    /// Zeroes `A` and assembles the iteration matrix at the trial state.
    ///
    /// This is the tangent stiffness, or the lumped mass for
    /// [`CentralDifference`].
    ///
    /// # Errors
    ///
    /// Returns an error if an element cannot form its tangent, or if an
    /// explicit integrator finds no lumped mass.
    pub fn form_tangent<M, S>(&mut self, model: &M, sys: &mut S) -> Result<(), Error>
    where
        M: StructuralModel,
        S: MatrixSystem,
    {
        match self {
            Self::LoadControl(_) | Self::ArcLength(_) => assemble::form_tangent(model, sys),
            Self::CentralDifference(i) => i.form_tangent(model, sys),
        }
    }

    /// Sets `B` to the unbalance `λ P - F_int` at the trial state.
    ///
    /// # Errors
    ///
    /// Returns an error if used before initialization or if an element cannot
    /// form its resisting force.
    pub fn form_unbalance<M, S>(&mut self, model: &M, soe: &mut S) -> Result<(), Error>
    where
        M: StructuralModel,
        S: LinearSoe,
    {
        match self {
            Self::LoadControl(i) => i.form_unbalance(model, soe),
            Self::ArcLength(i) => i.form_unbalance(model, soe),
            Self::CentralDifference(i) => i.form_unbalance(model, soe),
        }
    }

    /// Applies the increment solved into the system's `X` to the trial state.
    ///
    /// On return `X` holds the displacement increment actually applied,
    /// which is what convergence tests inspect.
    ///
    /// # Errors
    ///
    /// Returns an error if used before initialization, if the model fails
    /// state determination, or if the arc-length corrector fails.
    pub fn update<M, S>(&mut self, model: &mut M, soe: &mut S) -> Result<(), Error>
    where
        M: StructuralModel,
        S: LinearSoe,
    {
        match self {
            Self::LoadControl(i) => i.update(model, soe),
            Self::ArcLength(i) => i.update(model, soe),
            Self::CentralDifference(i) => i.update(model, soe),
        }
    }

    /// Makes the trial state permanent and records the committed load factor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if the model refuses to commit.
    pub fn commit<M: StructuralModel>(&mut self, model: &mut M) -> Result<(), Error> {
        model.commit_state().map_err(Error::model)?;
        match self {
            Self::LoadControl(i) => i.commit(),
            Self::ArcLength(i) => i.commit(),
            Self::CentralDifference(i) => i.commit(),
        }
        Ok(())
    }

    /// Restores the model and the load factor to the last commit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if the model cannot revert.
    pub fn revert<M: StructuralModel>(&mut self, model: &mut M) -> Result<(), Error> {
        model.revert_to_last_commit().map_err(Error::model)?;
        match self {
            Self::LoadControl(i) => i.revert(),
            Self::ArcLength(i) => i.revert(),
            Self::CentralDifference(i) => i.revert(),
        }
        Ok(())
    }

    /// Current (trial) load factor.
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        match self {
            Self::LoadControl(i) => i.load_factor(),
            Self::ArcLength(i) => i.load_factor(),
            Self::CentralDifference(i) => i.load_factor(),
        }
    }

    /// Returns `false` for explicit integrators that finish a step in one
    /// pass.
    #[must_use]
    pub fn requires_iteration(&self) -> bool {
        !matches!(self, Self::CentralDifference(_))
    }

    /// Returns `true` if the update is a plain displacement increment that a
    /// line search may rescale.
    #[must_use]
    pub fn supports_line_search(&self) -> bool {
        matches!(self, Self::LoadControl(_))
    }
}

/// One-line summary of the integrator and its current load factor.
impl fmt::Display for Integrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadControl(i) => {
                let c = i.config();
                write!(
                    f,
                    "LoadControl: λ = {}, Δλ = {} (Jd = {}, bounds [{}, {}])",
                    i.load_factor(),
                    i.increment(),
                    c.desired_iters(),
                    c.min_increment(),
                    c.max_increment()
                )
            }
            Self::ArcLength(i) => {
                let c = i.config();
                write!(
                    f,
                    "ArcLength: λ = {}, Δs = {}, α = {} ({:?}, {:?}, {:?})",
                    i.load_factor(),
                    c.arc_length(),
                    c.alpha(),
                    c.constraint(),
                    c.root_selection(),
                    c.predictor_sign()
                )
            }
            Self::CentralDifference(i) => write!(
                f,
                "CentralDifference: t = {}, Δt = {}, λ = {}",
                i.time(),
                i.config().dt(),
                i.load_factor()
            ),
        }
    }
}

fn check_size<M: StructuralModel, S: MatrixSystem>(model: &M, soe: &S) -> Result<(), Error> {
    let (model, soe) = (model.num_eqn(), soe.num_eqn());
    if model == soe {
        Ok(())
    } else {
        Err(Error::SizeMismatch { model, soe })
    }
}
