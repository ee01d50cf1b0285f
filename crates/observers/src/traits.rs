//! Capability traits for cross-solver observers.
//!
//! These traits abstract over solver-specific event and action types, so one
//! observer can watch any algorithm whose events expose the right data.
//!
//! # Event traits
//!
//! - [`HasNorm`]: events that carry a convergence metric
//! - [`HasLoadFactor`]: events that carry the trial load factor
//!
//! # Action traits
//!
//! - [`CanStopEarly`]: actions that can signal early termination
//!
//! # Example
//!
//! ```rust
//! use strut_core::Observer;
//! use strut_observers::traits::{CanStopEarly, HasLoadFactor};
//!
//! /// Stops the analysis once the load factor passes a target.
//! struct StopAtLoad {
//!     target: f64,
//! }
//!
//! impl<E: HasLoadFactor, A: CanStopEarly> Observer<E, A> for StopAtLoad {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.load_factor() > self.target).then(A::stop_early)
//!     }
//! }
//! ```

use strut_solvers::algorithm::newton;

/// An event that carries a convergence metric.
pub trait HasNorm {
    /// Returns the metric reported by the convergence test.
    fn norm(&self) -> f64;
}

/// An event that carries the trial load factor.
pub trait HasLoadFactor {
    /// Returns the load factor at the time of the event.
    fn load_factor(&self) -> f64;
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the solver early.
    fn stop_early() -> Self;
}

impl HasNorm for newton::Event {
    fn norm(&self) -> f64 {
        self.norm
    }
}

impl HasLoadFactor for newton::Event {
    fn load_factor(&self) -> f64 {
        self.load_factor
    }
}

impl CanStopEarly for newton::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}
