//! Incremental-iterative equilibrium solvers for nonlinear finite-element
//! models.
//!
//! An analysis advances a model along its equilibrium path one step at a
//! time. Each step has three collaborators:
//!
//! - an [`integrator`] that moves the control parameter (load factor or arc
//!   length), assembles the system, and applies increments to the model
//! - an [`algorithm`] that iterates the step to equilibrium (Newton-Raphson,
//!   optionally with a line search) or inspects the tangent for
//!   ill-conditioning
//! - a [`convergence`] test that decides when an iteration is done
//!
//! [`analysis::StaticAnalysis`] runs the outer loop over steps. The model and
//! the systems of equations are supplied through the `strut-core` traits;
//! [`linalg`] has small dense implementations of the latter.
//!
//! # Logging
//!
//! Diagnostics go through the [`log`] facade. The crate never installs a
//! logger.

pub mod algorithm;
pub mod analysis;
pub mod convergence;
pub mod integrator;
pub mod linalg;

#[cfg(test)]
mod test_utils;

pub use algorithm::{Algorithm, KEigen, NewtonRaphson};
pub use analysis::StaticAnalysis;
pub use convergence::ConvergenceTest;
pub use integrator::{ArcLength, CentralDifference, Integrator, LoadControl};
