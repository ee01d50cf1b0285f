/// Outcome of one convergence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The metric missed tolerance with iterations to spare.
    Continue,

    /// The metric met tolerance at the given iteration.
    Converged(usize),

    /// The metric missed tolerance at the final allowed iteration.
    Failed(usize),
}

impl Verdict {
    /// Returns `true` for [`Verdict::Continue`].
    #[must_use]
    pub fn is_continue(self) -> bool {
        matches!(self, Self::Continue)
    }
}
