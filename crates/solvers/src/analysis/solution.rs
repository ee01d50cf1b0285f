use crate::algorithm;

/// Indicates how an analysis run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Every requested step converged and was committed.
    Complete,

    /// An observer stopped a step; that step was reverted.
    StoppedByObserver,
}

/// The result of an analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Final status.
    pub status: Status,

    /// One entry per committed step, in order.
    pub steps: Vec<algorithm::Solution>,

    /// Committed load factor at the end of the run.
    pub load_factor: f64,
}
