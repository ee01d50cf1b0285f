use ndarray::{Array1, Array2, ArrayView1};

use crate::EigenPair;

/// A finite-element model as seen by the equilibrium solvers.
///
/// The model owns the displacement state and the element state determination.
/// Solvers never touch elements directly: they ask for element tangents and
/// resisting forces, scatter them through each element's local-to-global
/// equation map, and push displacement increments back.
///
/// Displacements moved with [`set_disp`] or [`incr_disp`] form a *trial*
/// state. The trial becomes permanent with [`commit_state`] and can be rolled
/// back with [`revert_to_last_commit`].
///
/// [`set_disp`]: StructuralModel::set_disp
/// [`incr_disp`]: StructuralModel::incr_disp
/// [`commit_state`]: StructuralModel::commit_state
/// [`revert_to_last_commit`]: StructuralModel::revert_to_last_commit
pub trait StructuralModel {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Number of active equations (unconstrained freedoms).
    fn num_eqn(&self) -> usize;

    /// Number of elements contributing to the global system.
    fn num_elements(&self) -> usize;

    /// Local-to-global equation map of element `e`.
    ///
    /// Entry `i` is the global equation of local freedom `i`, or `None` when
    /// that freedom is constrained and must not be assembled.
    fn element_dofs(&self, e: usize) -> &[Option<usize>];

    /// Tangent stiffness of element `e` at the trial state.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the element cannot form its tangent.
    fn element_tangent(&self, e: usize) -> Result<Array2<f64>, Self::Error>;

    /// Internal resisting force of element `e` at the trial state.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the element cannot form its resisting force.
    fn element_resisting_force(&self, e: usize) -> Result<Array1<f64>, Self::Error>;

    /// Reference load pattern `P` in equation numbering.
    ///
    /// The applied load is `λ · P` for the load factor `λ` owned by the
    /// integrator.
    fn reference_load(&self) -> ArrayView1<'_, f64>;

    /// Current trial displacement.
    fn disp(&self) -> ArrayView1<'_, f64>;

    /// Replaces the trial displacement and updates element state.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if element state determination fails.
    fn set_disp(&mut self, disp: ArrayView1<'_, f64>) -> Result<(), Self::Error>;

    /// Adds an increment to the trial displacement and updates element state.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if element state determination fails.
    fn incr_disp(&mut self, delta: ArrayView1<'_, f64>) -> Result<(), Self::Error>;

    /// Promotes the trial state to the committed state.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if an element refuses to commit.
    fn commit_state(&mut self) -> Result<(), Self::Error>;

    /// Restores the trial state to the last committed state.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if an element cannot revert.
    fn revert_to_last_commit(&mut self) -> Result<(), Self::Error>;

    /// Lumped (diagonal) mass in equation numbering, if the model has one.
    ///
    /// Only explicit dynamic integrators need it.
    fn lumped_mass(&self) -> Option<ArrayView1<'_, f64>> {
        None
    }

    /// Receives the eigen-pairs of the latest eigen analysis.
    ///
    /// The default implementation discards them.
    fn set_eigen_pairs(&mut self, _pairs: &[EigenPair]) {}
}
