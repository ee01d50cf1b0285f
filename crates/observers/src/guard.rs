//! An observer that stops iterating once the metric blows up.

use strut_core::Observer;

use crate::traits::{CanStopEarly, HasNorm};

/// Stops the solver when the metric is non-finite or exceeds a ceiling.
///
/// Newton iterations on a badly conditioned tangent can run away for the
/// full iteration budget before the convergence test gives up. This guard
/// ends the step as soon as the metric leaves the plausible range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivergenceGuard {
    ceiling: f64,
    tripped: Option<f64>,
}

impl DivergenceGuard {
    /// Creates a guard that trips when the metric exceeds `ceiling`.
    #[must_use]
    pub fn new(ceiling: f64) -> Self {
        Self {
            ceiling,
            tripped: None,
        }
    }

    #[must_use]
    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    /// The metric that tripped the guard, if it has tripped.
    #[must_use]
    pub fn tripped(&self) -> Option<f64> {
        self.tripped
    }
}

impl<E, A> Observer<E, A> for DivergenceGuard
where
    E: HasNorm,
    A: CanStopEarly,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        let norm = event.norm();
        if norm.is_finite() && norm <= self.ceiling {
            return None;
        }
        log::warn!("metric {norm:e} exceeds {:e}; stopping", self.ceiling);
        self.tripped = Some(norm);
        Some(A::stop_early())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Event(f64);

    impl HasNorm for Event {
        fn norm(&self) -> f64 {
            self.0
        }
    }

    #[derive(Debug, PartialEq)]
    struct Stop;

    impl CanStopEarly for Stop {
        fn stop_early() -> Self {
            Stop
        }
    }

    #[test]
    fn passes_metrics_under_the_ceiling() {
        let mut guard = DivergenceGuard::new(1e6);
        assert_eq!(guard.observe(&Event(1e3)), None::<Stop>);
        assert_eq!(guard.observe(&Event(1e6)), None::<Stop>);
        assert_eq!(guard.tripped(), None);
    }

    #[test]
    fn trips_above_the_ceiling() {
        let mut guard = DivergenceGuard::new(1e6);
        assert_eq!(guard.observe(&Event(2e6)), Some(Stop));
        assert_eq!(guard.tripped(), Some(2e6));
    }

    #[test]
    fn trips_on_nan() {
        let mut guard = DivergenceGuard::new(1e6);
        assert_eq!(guard.observe(&Event(f64::NAN)), Some(Stop));
        assert!(guard.tripped().is_some_and(f64::is_nan));
    }
}
