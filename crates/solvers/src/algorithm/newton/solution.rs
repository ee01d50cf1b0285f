/// Indicates how a Newton-Raphson step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The convergence test was satisfied.
    Converged,

    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

/// The result of a Newton-Raphson step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Final solver status.
    pub status: Status,

    /// Iterations taken.
    pub iters: usize,

    /// Final convergence metric.
    pub norm: f64,

    /// Load factor of the final trial state.
    pub load_factor: f64,
}
