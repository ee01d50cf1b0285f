//! Newton-Raphson iteration for one analysis step.
//!
//! # Algorithm
//!
//! Starting from the predictor applied by the integrator, each iteration
//! assembles the tangent `K` and unbalance `R`, solves `K ΔU = R`, applies
//! `ΔU` through the integrator, and asks the convergence test for a verdict.
//! [`TangentUpdate::FirstIteration`] keeps the first tangent for the whole
//! step (modified Newton).
//!
//! An optional [`LineSearch`] rescales each `ΔU` before the convergence test.
//! It needs an integrator whose update is a plain displacement increment, so
//! it is only available with load control.
//!
//! Integrators that do not iterate (explicit dynamics) take a single pass,
//! which always counts as converged.
//!
//! # Observer Events
//!
//! The solver emits one [`Event`] per iteration, after the convergence test.
//! Observers can return [`Action::StopEarly`] to leave the step with its
//! current trial state.

mod action;
mod config;
mod event;
mod solution;

pub mod line_search;


pub use action::Action;
pub use config::{Config, ConfigError, TangentUpdate};
pub use event::Event;
pub use line_search::{LineSearch, Method};
pub use solution::{Solution, Status};

use ndarray::Array1;
use strut_core::{LinearSoe, Observer, StructuralModel};

use crate::{
    convergence::{ConvergenceTest, Verdict},
    integrator::Integrator,
};

use super::Error;

/// Newton-Raphson solution algorithm.
#[derive(Debug, Clone, Default)]
pub struct NewtonRaphson {
    config: Config,
    dx: Array1<f64>,
    delta: Array1<f64>,
}

impl NewtonRaphson {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            dx: Array1::zeros(0),
            delta: Array1::zeros(0),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Iterates the current step to convergence.
    ///
    /// The integrator's predictor must already be applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid configuration or a line
    /// search with an unsupported integrator, [`Error::NotConverged`] when the
    /// convergence test fails, and the matching variant for any assembly,
    /// solve, or update failure.
    pub fn solve_step<M, S, Obs>(
        &mut self,
        step: usize,
        model: &mut M,
        integrator: &mut Integrator,
        soe: &mut S,
        test: &mut ConvergenceTest,
        observer: &mut Obs,
    ) -> Result<Solution, Error>
    where
        M: StructuralModel,
        S: LinearSoe,
        Obs: Observer<Event, Action>,
    {
        self.config
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        if self.config.line_search().is_some() && !integrator.supports_line_search() {
            return Err(Error::Config(
                "line search requires a load control integrator".into(),
            ));
        }

        let n = model.num_eqn();
        if self.dx.len() != n {
            self.dx = Array1::zeros(n);
            self.delta = Array1::zeros(n);
        }

        test.start();
        integrator
            .form_unbalance(model, soe)
            .map_err(Error::Assembly)?;

        if !integrator.requires_iteration() {
            return single_pass(step, model, integrator, soe, observer);
        }

        loop {
            let iter = test.iter().unwrap_or(1);

            if iter == 1 || self.config.tangent() == TangentUpdate::EveryIteration {
                integrator
                    .form_tangent(model, soe)
                    .map_err(Error::Assembly)?;
            }
            soe.solve().map_err(Error::linear_solve)?;

            let eta = match self.config.line_search().copied() {
                Some(ls) => Some(self.line_search_update(&ls, model, integrator, soe)?),
                None => {
                    integrator.update(model, soe).map_err(Error::Update)?;
                    integrator
                        .form_unbalance(model, soe)
                        .map_err(Error::Assembly)?;
                    None
                }
            };

            let verdict = test.test(soe.x(), soe.b())?;
            let norm = test.last_norm().unwrap_or(f64::NAN);
            let load_factor = integrator.load_factor();

            log::debug!("step {step} iter {iter}: norm = {norm:e}, λ = {load_factor}");

            let event = Event {
                step,
                iter,
                norm,
                load_factor,
                eta,
                verdict,
            };
            if let Some(Action::StopEarly) = observer.observe(&event) {
                return Ok(Solution {
                    status: Status::StoppedByObserver,
                    iters: iter,
                    norm,
                    load_factor,
                });
            }

            match verdict {
                Verdict::Continue => test.advance()?,
                Verdict::Converged(iters) => {
                    return Ok(Solution {
                        status: Status::Converged,
                        iters,
                        norm,
                        load_factor,
                    });
                }
                Verdict::Failed(iters) => return Err(Error::NotConverged { iters, norm }),
            }
        }
    }
}

impl NewtonRaphson {
    /// Applies the solved step, then rescales it with the line search.
    ///
    /// Returns the accepted scale.
    fn line_search_update<M, S>(
        &mut self,
        ls: &LineSearch,
        model: &mut M,
        integrator: &mut Integrator,
        soe: &mut S,
    ) -> Result<f64, Error>
    where
        M: StructuralModel,
        S: LinearSoe,
    {
        let Integrator::LoadControl(lc) = integrator else {
            return Err(Error::Config(
                "line search requires a load control integrator".into(),
            ));
        };

        self.dx.assign(&soe.x());
        let s0 = self.dx.dot(&soe.b());

        lc.update(model, soe).map_err(Error::Update)?;
        lc.form_unbalance(model, soe).map_err(Error::Assembly)?;
        let s1 = self.dx.dot(&soe.b());

        line_search::search(ls, s0, s1, model, lc, soe, &self.dx, &mut self.delta)
    }
}

/// Explicit integrators: assemble, solve, and update once.
fn single_pass<M, S, Obs>(
    step: usize,
    model: &mut M,
    integrator: &mut Integrator,
    soe: &mut S,
    observer: &mut Obs,
) -> Result<Solution, Error>
where
    M: StructuralModel,
    S: LinearSoe,
    Obs: Observer<Event, Action>,
{
    integrator
        .form_tangent(model, soe)
        .map_err(Error::Assembly)?;
    soe.solve().map_err(Error::linear_solve)?;
    integrator.update(model, soe).map_err(Error::Update)?;

    let load_factor = integrator.load_factor();
    let norm = 0.0;
    let event = Event {
        step,
        iter: 1,
        norm,
        load_factor,
        eta: None,
        verdict: Verdict::Converged(1),
    };
    let status = match observer.observe(&event) {
        Some(Action::StopEarly) => Status::StoppedByObserver,
        None => Status::Converged,
    };

    Ok(Solution {
        status,
        iters: 1,
        norm,
        load_factor,
    })
}
