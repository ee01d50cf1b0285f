use ndarray::{ArrayView1, ArrayView2};

use crate::Which;

/// A system whose left-hand matrix is assembled from element contributions.
///
/// Assembly is additive: callers zero the matrix once, then add each
/// contribution through its local-to-global map. Map entries that are `None`
/// are constrained freedoms and are skipped.
pub trait MatrixSystem {
    /// Number of equations.
    fn num_eqn(&self) -> usize;

    /// Zeroes the left-hand matrix.
    fn zero_a(&mut self);

    /// Adds `fact · m` into the left-hand matrix through `dofs`.
    fn add_a(&mut self, dofs: &[Option<usize>], m: ArrayView2<'_, f64>, fact: f64);
}

/// A linear system of equations `A x = b`.
///
/// Calling [`solve`](LinearSoe::solve) again after changing only `b` must
/// reuse the existing factorization of `A`. Solving never modifies `b`.
pub trait LinearSoe: MatrixSystem {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Zeroes the right-hand side.
    fn zero_b(&mut self);

    /// Adds `fact · v` into the right-hand side through `dofs`.
    fn add_b(&mut self, dofs: &[Option<usize>], v: ArrayView1<'_, f64>, fact: f64);

    /// Current right-hand side.
    fn b(&self) -> ArrayView1<'_, f64>;

    /// Replaces the right-hand side.
    fn set_b(&mut self, b: ArrayView1<'_, f64>);

    /// Current solution vector.
    fn x(&self) -> ArrayView1<'_, f64>;

    /// Replaces the solution vector.
    fn set_x(&mut self, x: ArrayView1<'_, f64>);

    /// Solves `A x = b`, leaving the result in [`x`](LinearSoe::x).
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the system cannot be factored or solved.
    fn solve(&mut self) -> Result<(), Self::Error>;
}

/// A generalized eigenproblem `A x = σ M x`.
pub trait EigenSoe: MatrixSystem {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Zeroes the mass matrix.
    fn zero_m(&mut self);

    /// Adds `fact · m` into the mass matrix through `dofs`.
    fn add_m(&mut self, dofs: &[Option<usize>], m: ArrayView2<'_, f64>, fact: f64);

    /// Estimate of the reciprocal condition number of `A`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the estimate cannot be formed.
    fn rcond(&mut self) -> Result<f64, Self::Error>;

    /// Solves for `num_modes` eigen-pairs from the requested end of the
    /// spectrum.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the eigen solve fails.
    fn solve(&mut self, num_modes: usize, which: Which) -> Result<(), Self::Error>;

    /// Number of eigen-pairs available from the last solve.
    fn num_modes(&self) -> usize;

    /// Eigenvalue of mode `i` from the last solve.
    fn eigenvalue(&self, i: usize) -> f64;

    /// Eigenvector of mode `i` from the last solve.
    fn eigenvector(&self, i: usize) -> ArrayView1<'_, f64>;
}
