/// Actions an observer can take during Newton-Raphson iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop iterating and return the current trial state uncommitted.
    StopEarly,
}
