use crate::convergence::Verdict;

/// Emitted once per Newton iteration, after the convergence test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Analysis step the iteration belongs to.
    pub step: usize,

    /// Iteration number within the step, 1-based.
    pub iter: usize,

    /// Metric reported by the convergence test.
    pub norm: f64,

    /// Trial load factor after the update.
    pub load_factor: f64,

    /// Step scale chosen by the line search, if one ran.
    pub eta: Option<f64>,

    /// Verdict of the convergence test for this iteration.
    pub verdict: Verdict,
}
