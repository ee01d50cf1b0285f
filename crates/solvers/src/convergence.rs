//! Convergence tests for equilibrium iterations.
//!
//! A [`ConvergenceTest`] inspects the solved increment `ΔU` and the unbalance
//! `R` after each Newton update and returns a [`Verdict`]. The variants only
//! differ in the scalar metric they compare against the tolerance; see
//! [`Kind`].
//!
//! # Protocol
//!
//! 1. [`start`](ConvergenceTest::start) at the beginning of every step.
//!    This resets the iteration counter to 1 and clears the history.
//! 2. [`test`](ConvergenceTest::test) after each update. The verdict is a pure
//!    function of `ΔU`, `R`, and the iteration counter, so testing twice
//!    without moving on gives the same answer.
//! 3. [`advance`](ConvergenceTest::advance) after a [`Verdict::Continue`].
//!
//! Relative metrics capture their reference on iteration 1. A reference of
//! zero leaves the metric unscaled.

mod config;
mod error;
mod norm;
mod verdict;

#[cfg(test)]
mod tests;

pub use config::{Config, ConfigError, Kind, Verbosity};
pub use error::Error;
pub use norm::Norm;
pub use verdict::Verdict;

use std::fmt;

use ndarray::ArrayView1;

/// A convergence test with its per-step history.
#[derive(Debug, Clone)]
pub struct ConvergenceTest {
    config: Config,
    state: Option<State>,
}

/// Per-step bookkeeping, created by `start`.
#[derive(Debug, Clone)]
struct State {
    iter: usize,

    /// Raw metric of each iteration, before any relative scaling.
    raw: Vec<f64>,

    /// Metric compared against the tolerance, per iteration.
    history: Vec<f64>,

    /// `‖R‖` per iteration, for the combined kinds.
    unbalance: Vec<f64>,
}

impl ConvergenceTest {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resets the iteration counter to 1 and clears the history.
    pub fn start(&mut self) {
        let cap = self.config.max_iters();
        self.state = Some(State {
            iter: 1,
            raw: Vec::with_capacity(cap),
            history: Vec::with_capacity(cap),
            unbalance: Vec::with_capacity(cap),
        });
    }

    /// Current iteration, 1-based, or `None` before [`start`](Self::start).
    #[must_use]
    pub fn iter(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.iter)
    }

    /// Tested metric of each iteration of the current step.
    #[must_use]
    pub fn history(&self) -> &[f64] {
        self.state.as_ref().map_or(&[][..], |s| s.history.as_slice())
    }

    /// `‖R‖` of each iteration, recorded only by the combined kinds.
    #[must_use]
    pub fn unbalance_history(&self) -> &[f64] {
        self.state.as_ref().map_or(&[][..], |s| s.unbalance.as_slice())
    }

    /// Tested metric of the latest call to [`test`](Self::test).
    #[must_use]
    pub fn last_norm(&self) -> Option<f64> {
        self.history().last().copied()
    }

    /// Moves to the next iteration.
    ///
    /// The counter saturates at `max_iters`, which bounds the history.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotStarted`] before [`start`](Self::start).
    pub fn advance(&mut self) -> Result<(), Error> {
        let state = self.state.as_mut().ok_or(Error::NotStarted)?;
        state.iter = (state.iter + 1).min(self.config.max_iters());
        Ok(())
    }

    /// Checks the increment `x` and unbalance `b` at the current iteration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotStarted`] before [`start`](Self::start),
    /// [`Error::SizeMismatch`] if `x` and `b` differ in length, or
    /// [`Error::Config`] if the config fails validation.
    pub fn test(
        &mut self,
        x: ArrayView1<'_, f64>,
        b: ArrayView1<'_, f64>,
    ) -> Result<Verdict, Error> {
        let config = self.config;
        let state = self.state.as_mut().ok_or(Error::NotStarted)?;
        config.validate()?;

        if x.len() != b.len() {
            return Err(Error::SizeMismatch {
                x: x.len(),
                b: b.len(),
            });
        }

        let norm = config.norm();
        let tol = config.tolerance();
        let iter = state.iter;

        let (raw, unbalance) = match config.kind() {
            Kind::NormDispIncr
            | Kind::RelativeNormDispIncr
            | Kind::RelativeTotalNormDispIncr
            | Kind::FixedNumIter => (norm.of(x), None),
            Kind::NormUnbalance | Kind::RelativeNormUnbalance => (norm.of(b), None),
            Kind::EnergyIncr | Kind::RelativeEnergyIncr => (0.5 * x.dot(&b).abs(), None),
            Kind::NormDispAndUnbalance { .. } | Kind::NormDispOrUnbalance { .. } => {
                (norm.of(x), Some(norm.of(b)))
            }
        };

        state.record_raw(raw);
        let metric = match config.kind() {
            Kind::RelativeNormDispIncr | Kind::RelativeNormUnbalance | Kind::RelativeEnergyIncr => {
                scale(raw, state.raw[0])
            }
            Kind::RelativeTotalNormDispIncr => scale(raw, state.raw.iter().sum()),
            _ => raw,
        };
        state.record(metric, unbalance);

        let passed = match config.kind() {
            Kind::FixedNumIter => iter >= config.max_iters(),
            Kind::NormDispAndUnbalance { unbalance_tol } => {
                metric <= tol && unbalance.is_some_and(|r| r <= unbalance_tol)
            }
            Kind::NormDispOrUnbalance { unbalance_tol } => {
                metric <= tol || unbalance.is_some_and(|r| r <= unbalance_tol)
            }
            _ => metric <= tol,
        };

        let verdict = if passed {
            Verdict::Converged(iter)
        } else if iter >= config.max_iters() {
            Verdict::Failed(iter)
        } else {
            Verdict::Continue
        };

        report(&config, iter, metric, x, b, verdict);
        Ok(verdict)
    }
}

/// Summarizes the configuration and the latest tested metric.
impl fmt::Display for ConvergenceTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = &self.config;
        write!(
            f,
            "{:?}: tol = {:e}, max iters = {}, norm = {:?}",
            config.kind(),
            config.tolerance(),
            config.max_iters(),
            config.norm()
        )?;
        match (self.iter(), self.last_norm()) {
            (Some(iter), Some(norm)) => write!(f, ", iter {iter}: {norm:e}"),
            _ => Ok(()),
        }
    }
}

impl State {
    /// Stores the raw metric of the current iteration, replacing any earlier
    /// test of the same iteration.
    fn record_raw(&mut self, raw: f64) {
        let slot = self.iter - 1;
        self.raw.truncate(slot);
        self.raw.resize(slot, 0.0);
        self.raw.push(raw);
    }

    fn record(&mut self, metric: f64, unbalance: Option<f64>) {
        let slot = self.iter - 1;
        self.history.truncate(slot);
        self.history.resize(slot, f64::NAN);
        self.history.push(metric);

        if let Some(r) = unbalance {
            self.unbalance.truncate(slot);
            self.unbalance.resize(slot, f64::NAN);
            self.unbalance.push(r);
        }
    }
}

fn scale(value: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        value
    } else {
        value / reference
    }
}

fn report(
    config: &Config,
    iter: usize,
    metric: f64,
    x: ArrayView1<'_, f64>,
    b: ArrayView1<'_, f64>,
    verdict: Verdict,
) {
    let tol = config.tolerance();
    let kind = config.kind();

    match config.verbosity() {
        Verbosity::Silent => return,
        Verbosity::EachIteration => {
            log::info!("{kind:?} iter {iter}: {metric:e} (tol {tol:e})");
        }
        Verbosity::Detailed => {
            let norm = config.norm();
            log::info!(
                "{kind:?} iter {iter}: {metric:e} (tol {tol:e}), |dU| = {:e}, |R| = {:e}",
                norm.of(x),
                norm.of(b),
            );
        }
        Verbosity::OnSuccess => {}
    }

    match verdict {
        Verdict::Converged(n) => {
            log::info!("{kind:?} converged after {n} iterations: {metric:e}");
        }
        Verdict::Failed(n) => {
            log::warn!("{kind:?} failed after {n} iterations: {metric:e} > {tol:e}");
        }
        Verdict::Continue => {}
    }
}
