//! An observer that forwards iteration events to the `log` facade.

use log::Level;
use strut_core::Observer;

use crate::traits::{HasLoadFactor, HasNorm};

/// Logs every observed event at a fixed level and never acts.
///
/// Useful when the convergence test runs silently but a caller still wants a
/// trace of the iterations in the application's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogObserver {
    level: Level,
    events: usize,
}

impl LogObserver {
    /// Creates an observer that logs at `level`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level, events: 0 }
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Number of events seen so far.
    #[must_use]
    pub fn events(&self) -> usize {
        self.events
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new(Level::Debug)
    }
}

impl<E, A> Observer<E, A> for LogObserver
where
    E: HasNorm + HasLoadFactor,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self.events += 1;
        log::log!(
            self.level,
            "event {}: norm = {:e}, λ = {}",
            self.events,
            event.norm(),
            event.load_factor()
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Event {
        norm: f64,
        load_factor: f64,
    }

    impl HasNorm for Event {
        fn norm(&self) -> f64 {
            self.norm
        }
    }

    impl HasLoadFactor for Event {
        fn load_factor(&self) -> f64 {
            self.load_factor
        }
    }

    #[test]
    fn counts_events_and_never_acts() {
        let mut obs = LogObserver::new(Level::Info);
        for i in 0..3 {
            let action: Option<()> = obs.observe(&Event {
                norm: 10f64.powi(-i),
                load_factor: 0.5,
            });
            assert!(action.is_none());
        }
        assert_eq!(obs.events(), 3);
        assert_eq!(obs.level(), Level::Info);
    }

    #[test]
    fn default_logs_at_debug() {
        assert_eq!(LogObserver::default().level(), Level::Debug);
    }
}
