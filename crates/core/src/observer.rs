/// Watches the equilibrium iterations of a step and may cut them short.
///
/// The Newton solver reports one event per iteration, after the convergence
/// test has judged the tested norm. Returning `Some(action)` asks the solver to act on it;
/// for Newton the only action is `StopEarly`, which leaves the trial state
/// in place and reports the step as stopped. `None` keeps iterating.
///
/// The static analysis driver passes one observer to every step it runs, so
/// a single observer sees the whole equilibrium path.
///
/// Any `FnMut(&E) -> Option<A>` closure is an observer. `()` ignores every
/// event.
pub trait Observer<E, A> {
    /// Handles one iteration event.
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
