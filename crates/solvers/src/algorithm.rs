//! Solution algorithms: what happens inside one analysis step.
//!
//! # Algorithms
//!
//! - [`newton`]: Newton-Raphson iteration, optionally modified and with a
//!   line search
//! - [`k_eigen`]: an ill-conditioning detector that runs an eigen analysis
//!   of the tangent instead of iterating
//!
//! Both are driven through [`Algorithm::solve_current_step`], which takes the
//! step's collaborators bundled in a [`Context`]. Neither retries a failed
//! step; the caller decides whether to cut the increment and try again.

pub mod k_eigen;
pub mod newton;

mod error;

pub use error::Error;
pub use k_eigen::KEigen;
pub use newton::NewtonRaphson;

use std::fmt;

use strut_core::{EigenSoe, LinearSoe, Observer, StructuralModel};

use crate::{convergence::ConvergenceTest, integrator::Integrator};

/// The collaborators of one step.
pub struct Context<'a, M, S, E> {
    /// Analysis step number, used in events and log messages.
    pub step: usize,
    pub model: &'a mut M,
    pub integrator: &'a mut Integrator,
    pub soe: &'a mut S,

    /// Only the eigen detector needs one.
    pub eigen: Option<&'a mut E>,
    pub test: &'a mut ConvergenceTest,
}

/// The solution algorithms available to an analysis.
#[derive(Debug, Clone)]
pub enum Algorithm {
    NewtonRaphson(NewtonRaphson),
    KEigen(KEigen),
}

/// The result of one step, by algorithm.
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    Newton(newton::Solution),
    KEigen(k_eigen::Report),
}

impl Solution {
    /// Returns `true` if an observer ended the step early.
    #[must_use]
    pub fn stopped_by_observer(&self) -> bool {
        matches!(
            self,
            Self::Newton(newton::Solution {
                status: newton::Status::StoppedByObserver,
                ..
            })
        )
    }
}

impl From<NewtonRaphson> for Algorithm {
    fn from(algorithm: NewtonRaphson) -> Self {
        Self::NewtonRaphson(algorithm)
    }
}

impl From<KEigen> for Algorithm {
    fn from(algorithm: KEigen) -> Self {
        Self::KEigen(algorithm)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewtonRaphson(newton) => {
                let config = newton.config();
                write!(f, "NewtonRaphson: tangent {:?}", config.tangent())?;
                match config.line_search() {
                    Some(ls) => {
                        write!(f, ", {:?} line search (tol {})", ls.method(), ls.tolerance())
                    }
                    None => Ok(()),
                }
            }
            Self::KEigen(detector) => {
                let config = detector.config();
                write!(
                    f,
                    "KEigen: cond threshold {:e}, {} mode(s)",
                    config.cond_number_threshold(),
                    config.num_modes()
                )
            }
        }
    }
}

impl Algorithm {
    /// Solves the current step.
    ///
    /// The integrator's `new_step` must already have run. The observer only
    /// sees Newton iterations.
    ///
    /// # Errors
    ///
    /// Returns the algorithm's [`Error`]; use [`Error::code`] for the legacy
    /// numeric status.
    pub fn solve_current_step<M, S, E, Obs>(
        &mut self,
        ctx: Context<'_, M, S, E>,
        observer: &mut Obs,
    ) -> Result<Solution, Error>
    where
        M: StructuralModel,
        S: LinearSoe,
        E: EigenSoe,
        Obs: Observer<newton::Event, newton::Action>,
    {
        let Context {
            step,
            model,
            integrator,
            soe,
            eigen,
            test,
        } = ctx;

        match self {
            Self::NewtonRaphson(newton) => newton
                .solve_step(step, model, integrator, soe, test, observer)
                .map(Solution::Newton),
            Self::KEigen(detector) => detector
                .solve_step(step, model, integrator, eigen)
                .map(Solution::KEigen),
        }
    }
}
