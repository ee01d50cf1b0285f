//! Small synthetic models shared by the solver tests.

use ndarray::{Array1, Array2, ArrayView1, array};
use strut_core::{EigenPair, StructuralModel};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("element state determination failed")]
pub(crate) struct ElementFailure;

/// A single-element model whose element spans every equation.
///
/// Forces and tangents are plain functions of the trial displacement.
pub(crate) struct SpringModel {
    dofs: Vec<Option<usize>>,
    force: fn(ArrayView1<'_, f64>) -> Array1<f64>,
    tangent: fn(ArrayView1<'_, f64>) -> Array2<f64>,
    load: Array1<f64>,
    disp: Array1<f64>,
    committed: Array1<f64>,
    mass: Option<Array1<f64>>,
    pub(crate) eigen_pairs: Vec<EigenPair>,
    pub(crate) state_determinations: usize,
    pub(crate) fail_tangent: bool,
}

impl SpringModel {
    fn new(
        load: Array1<f64>,
        force: fn(ArrayView1<'_, f64>) -> Array1<f64>,
        tangent: fn(ArrayView1<'_, f64>) -> Array2<f64>,
    ) -> Self {
        let n = load.len();
        Self {
            dofs: (0..n).map(Some).collect(),
            force,
            tangent,
            load,
            disp: Array1::zeros(n),
            committed: Array1::zeros(n),
            mass: None,
            eigen_pairs: Vec::new(),
            state_determinations: 0,
            fail_tangent: false,
        }
    }

    /// One spring of stiffness 100 under a reference load of 10.
    pub(crate) fn linear() -> Self {
        Self::new(array![10.0], |u| &u * 100.0, |_| array![[100.0]])
    }

    /// One unit spring with a unit reference load.
    pub(crate) fn unit() -> Self {
        Self::new(array![1.0], |u| u.to_owned(), |_| array![[1.0]])
    }

    /// `f(u) = u + u³` under a reference load of 10.
    pub(crate) fn hardening() -> Self {
        Self::new(
            array![10.0],
            |u| array![u[0] + u[0].powi(3)],
            |u| array![[1.0 + 3.0 * u[0] * u[0]]],
        )
    }

    /// A softening spring (`u₁ - u₁³/3`) in series with a unit spring, loaded
    /// at the free end.
    ///
    /// The load factor peaks at 2/3 when `u₁ = 1`.
    pub(crate) fn softening_pair() -> Self {
        Self::new(
            array![0.0, 1.0],
            |u| {
                let (u1, u2) = (u[0], u[1]);
                array![u1 - u1.powi(3) / 3.0 - (u2 - u1), u2 - u1]
            },
            |u| array![[2.0 - u[0] * u[0], -1.0], [-1.0, 1.0]],
        )
    }

    /// A spring whose tangent vanishes everywhere.
    pub(crate) fn zero_stiffness() -> Self {
        Self::new(array![1.0, 1.0], |u| &u * 0.0, |_| Array2::zeros((2, 2)))
    }

    pub(crate) fn with_mass(self, mass: Array1<f64>) -> Self {
        Self {
            mass: Some(mass),
            ..self
        }
    }

    /// Moves both trial and committed states to `disp`.
    pub(crate) fn with_initial_disp(mut self, disp: Array1<f64>) -> Self {
        self.committed.assign(&disp);
        self.disp = disp;
        self
    }

    /// Resisting force at the trial state.
    pub(crate) fn resisting_force(&self) -> Array1<f64> {
        (self.force)(self.disp.view())
    }
}

impl StructuralModel for SpringModel {
    type Error = ElementFailure;

    fn num_eqn(&self) -> usize {
        self.load.len()
    }

    fn num_elements(&self) -> usize {
        1
    }

    fn element_dofs(&self, _e: usize) -> &[Option<usize>] {
        &self.dofs
    }

    fn element_tangent(&self, _e: usize) -> Result<Array2<f64>, Self::Error> {
        if self.fail_tangent {
            return Err(ElementFailure);
        }
        Ok((self.tangent)(self.disp.view()))
    }

    fn element_resisting_force(&self, _e: usize) -> Result<Array1<f64>, Self::Error> {
        Ok((self.force)(self.disp.view()))
    }

    fn reference_load(&self) -> ArrayView1<'_, f64> {
        self.load.view()
    }

    fn disp(&self) -> ArrayView1<'_, f64> {
        self.disp.view()
    }

    fn set_disp(&mut self, disp: ArrayView1<'_, f64>) -> Result<(), Self::Error> {
        self.disp.assign(&disp);
        self.state_determinations += 1;
        Ok(())
    }

    fn incr_disp(&mut self, delta: ArrayView1<'_, f64>) -> Result<(), Self::Error> {
        self.disp += &delta;
        self.state_determinations += 1;
        Ok(())
    }

    fn commit_state(&mut self) -> Result<(), Self::Error> {
        self.committed.assign(&self.disp);
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> Result<(), Self::Error> {
        self.disp.assign(&self.committed);
        Ok(())
    }

    fn lumped_mass(&self) -> Option<ArrayView1<'_, f64>> {
        self.mass.as_ref().map(Array1::view)
    }

    fn set_eigen_pairs(&mut self, pairs: &[EigenPair]) {
        self.eigen_pairs = pairs.to_vec();
    }
}
