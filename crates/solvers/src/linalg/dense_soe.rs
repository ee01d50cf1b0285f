use nalgebra::{DMatrix, DVector, Dyn, LU};
use ndarray::{Array1, ArrayView1, ArrayView2};
use strut_core::{LinearSoe, MatrixSystem};
use thiserror::Error;

use super::assemble::{scatter_matrix, scatter_vector};

/// Errors from the dense linear system.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SoeError {
    #[error("matrix is singular: zero pivot at equation {pivot}")]
    Singular { pivot: usize },
}

/// Dense linear system `A x = b` solved by LU with partial pivoting.
///
/// The factorization is cached until `A` is modified, so repeated solves
/// with a new right-hand side only pay for the triangular substitutions.
#[derive(Debug, Clone)]
pub struct DenseSoe {
    a: DMatrix<f64>,
    b: Array1<f64>,
    x: Array1<f64>,
    factor: Option<LU<f64, Dyn, Dyn>>,
}

impl DenseSoe {
    /// Creates a zeroed system with `num_eqn` equations.
    #[must_use]
    pub fn new(num_eqn: usize) -> Self {
        Self {
            a: DMatrix::zeros(num_eqn, num_eqn),
            b: Array1::zeros(num_eqn),
            x: Array1::zeros(num_eqn),
            factor: None,
        }
    }

    /// Returns the assembled left-hand matrix.
    #[must_use]
    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    /// Returns `true` if a factorization of the current `A` is cached.
    #[must_use]
    pub fn is_factored(&self) -> bool {
        self.factor.is_some()
    }
}

/// Factors `a`, treating pivots below `f64::EPSILON` times its largest entry
/// as zero.
fn factor(a: &DMatrix<f64>) -> Result<LU<f64, Dyn, Dyn>, SoeError> {
    let threshold = f64::EPSILON * a.amax();
    let lu = a.clone().lu();
    match zero_pivot(&lu, threshold) {
        Some(pivot) => Err(SoeError::Singular { pivot }),
        None => Ok(lu),
    }
}

fn zero_pivot(lu: &LU<f64, Dyn, Dyn>, threshold: f64) -> Option<usize> {
    lu.u().diagonal().iter().position(|d| d.abs() <= threshold)
}

impl MatrixSystem for DenseSoe {
    fn num_eqn(&self) -> usize {
        self.b.len()
    }

    fn zero_a(&mut self) {
        self.a.fill(0.0);
        self.factor = None;
    }

    fn add_a(&mut self, dofs: &[Option<usize>], m: ArrayView2<'_, f64>, fact: f64) {
        if fact == 0.0 {
            return;
        }
        scatter_matrix(&mut self.a, dofs, m, fact);
        self.factor = None;
    }
}

impl LinearSoe for DenseSoe {
    type Error = SoeError;

    fn zero_b(&mut self) {
        self.b.fill(0.0);
    }

    fn add_b(&mut self, dofs: &[Option<usize>], v: ArrayView1<'_, f64>, fact: f64) {
        scatter_vector(&mut self.b, dofs, v, fact);
    }

    fn b(&self) -> ArrayView1<'_, f64> {
        self.b.view()
    }

    fn set_b(&mut self, b: ArrayView1<'_, f64>) {
        self.b.assign(&b);
    }

    fn x(&self) -> ArrayView1<'_, f64> {
        self.x.view()
    }

    fn set_x(&mut self, x: ArrayView1<'_, f64>) {
        self.x.assign(&x);
    }

    fn solve(&mut self) -> Result<(), Self::Error> {
        let lu = match self.factor.take() {
            Some(lu) => lu,
            None => factor(&self.a)?,
        };

        let b = DVector::from_iterator(self.b.len(), self.b.iter().copied());
        let x = lu.solve(&b).ok_or_else(|| SoeError::Singular {
            pivot: zero_pivot(&lu, 0.0).unwrap_or_default(),
        })?;

        self.x = x.iter().copied().collect();
        self.factor = Some(lu);
        Ok(())
    }
}
