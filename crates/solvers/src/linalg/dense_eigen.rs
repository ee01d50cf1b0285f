use nalgebra::{DMatrix, Dyn, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use strut_core::{EigenSoe, MatrixSystem, Which};
use thiserror::Error;

use super::assemble::scatter_matrix;

/// Iteration cap for the implicit QR sweeps of the symmetric eigen solve.
const MAX_ITERATIONS: usize = 1000;

/// Errors from the dense eigen system.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EigenError {
    #[error("mass matrix must be diagonal")]
    NonDiagonalMass,

    #[error("mass matrix has a non-positive diagonal entry at equation {eq}")]
    NonPositiveMass { eq: usize },

    #[error("symmetric eigen solve did not converge in {} iterations", MAX_ITERATIONS)]
    NotConverged,

    #[error("requested {requested} modes but the system has {available} equations")]
    InvalidModeCount { requested: usize, available: usize },
}

/// Dense generalized eigenproblem `A x = σ M x` for a diagonal mass.
///
/// The full spectrum of `M^-1/2 A M^-1/2` is computed with a symmetric QR
/// decomposition; the requested modes are then selected by magnitude.
/// Eigenvectors are returned `M`-orthonormal.
#[derive(Debug, Clone)]
pub struct DenseEigenSoe {
    a: DMatrix<f64>,
    m: DMatrix<f64>,
    values: Array1<f64>,
    vectors: Array2<f64>,
}

impl DenseEigenSoe {
    /// Creates a zeroed system with `num_eqn` equations.
    #[must_use]
    pub fn new(num_eqn: usize) -> Self {
        Self {
            a: DMatrix::zeros(num_eqn, num_eqn),
            m: DMatrix::zeros(num_eqn, num_eqn),
            values: Array1::zeros(0),
            vectors: Array2::zeros((num_eqn, 0)),
        }
    }

    /// Returns the diagonal of `M`, checking it is a valid lumped mass.
    fn lumped_mass(&self) -> Result<Array1<f64>, EigenError> {
        let diag: Array1<f64> = self.m.diagonal().iter().copied().collect();
        let scale = diag.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));

        let n = self.m.nrows();
        let off_diagonal = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .any(|(i, j)| i != j && self.m[(i, j)].abs() > f64::EPSILON * scale);
        if off_diagonal {
            return Err(EigenError::NonDiagonalMass);
        }

        match diag.iter().position(|&v| v <= 0.0) {
            Some(eq) => Err(EigenError::NonPositiveMass { eq }),
            None => Ok(diag),
        }
    }
}

fn symmetric_eigen(matrix: DMatrix<f64>) -> Result<SymmetricEigen<f64, Dyn>, EigenError> {
    SymmetricEigen::try_new(matrix, f64::EPSILON, MAX_ITERATIONS)
        .ok_or(EigenError::NotConverged)
}

impl MatrixSystem for DenseEigenSoe {
    fn num_eqn(&self) -> usize {
        self.a.nrows()
    }

    fn zero_a(&mut self) {
        self.a.fill(0.0);
    }

    fn add_a(&mut self, dofs: &[Option<usize>], m: ArrayView2<'_, f64>, fact: f64) {
        scatter_matrix(&mut self.a, dofs, m, fact);
    }
}

impl EigenSoe for DenseEigenSoe {
    type Error = EigenError;

    fn zero_m(&mut self) {
        self.m.fill(0.0);
    }

    fn add_m(&mut self, dofs: &[Option<usize>], m: ArrayView2<'_, f64>, fact: f64) {
        scatter_matrix(&mut self.m, dofs, m, fact);
    }

    /// Reciprocal 2-norm condition number of `A`, `min|σ| / max|σ|`.
    ///
    /// A zero matrix reports 0.
    fn rcond(&mut self) -> Result<f64, Self::Error> {
        if self.a.is_empty() {
            return Ok(0.0);
        }
        let eig = symmetric_eigen(self.a.clone())?;
        let (min, max) = eig
            .eigenvalues
            .iter()
            .map(|v| v.abs())
            .fold((f64::INFINITY, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));

        if max == 0.0 { Ok(0.0) } else { Ok(min / max) }
    }

    fn solve(&mut self, num_modes: usize, which: Which) -> Result<(), Self::Error> {
        let n = self.num_eqn();
        if num_modes == 0 || num_modes > n {
            return Err(EigenError::InvalidModeCount {
                requested: num_modes,
                available: n,
            });
        }

        let scale = self.lumped_mass()?.mapv(|m| 1.0 / m.sqrt());
        let scaled = DMatrix::from_fn(n, n, |i, j| scale[i] * self.a[(i, j)] * scale[j]);
        let eig = symmetric_eigen(scaled)?;
        let values = &eig.eigenvalues;

        let mut order: Vec<usize> = (0..n).collect();
        match which {
            Which::SmallestMagnitude => {
                order.sort_by(|&i, &j| values[i].abs().total_cmp(&values[j].abs()));
            }
            Which::LargestMagnitude => {
                order.sort_by(|&i, &j| values[j].abs().total_cmp(&values[i].abs()));
            }
        }
        order.truncate(num_modes);

        self.values = order.iter().map(|&i| values[i]).collect();
        self.vectors = Array2::from_shape_fn((n, num_modes), |(k, mode)| {
            scale[k] * eig.eigenvectors[(k, order[mode])]
        });
        Ok(())
    }

    fn num_modes(&self) -> usize {
        self.values.len()
    }

    fn eigenvalue(&self, i: usize) -> f64 {
        self.values[i]
    }

    fn eigenvector(&self, i: usize) -> ArrayView1<'_, f64> {
        self.vectors.column(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    fn identity_mass(soe: &mut DenseEigenSoe) {
        let n = soe.num_eqn();
        let dofs: Vec<_> = (0..n).map(Some).collect();
        soe.add_m(&dofs, Array2::eye(n).view(), 1.0);
    }

    #[test]
    fn selects_modes_by_magnitude() {
        let mut soe = DenseEigenSoe::new(3);
        let dofs = [Some(0), Some(1), Some(2)];
        soe.add_a(&dofs, array![[-5.0, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 2.0]].view(), 1.0);
        identity_mass(&mut soe);

        soe.solve(2, Which::SmallestMagnitude).expect("solves");
        assert_eq!(soe.num_modes(), 2);
        assert_relative_eq!(soe.eigenvalue(0), 0.5);
        assert_relative_eq!(soe.eigenvalue(1), 2.0);
        assert_relative_eq!(soe.eigenvector(0)[1].abs(), 1.0);

        soe.solve(1, Which::LargestMagnitude).expect("solves");
        assert_relative_eq!(soe.eigenvalue(0), -5.0);
    }

    #[test]
    fn generalized_problem_with_lumped_mass() {
        let mut soe = DenseEigenSoe::new(2);
        let dofs = [Some(0), Some(1)];
        soe.add_a(&dofs, array![[6.0, -2.0], [-2.0, 4.0]].view(), 1.0);
        soe.add_m(&dofs, array![[2.0, 0.0], [0.0, 1.0]].view(), 1.0);

        soe.solve(2, Which::SmallestMagnitude).expect("solves");

        // det(K - σM) = 2σ² - 14σ + 20 = 0.
        assert_relative_eq!(soe.eigenvalue(0), 2.0, epsilon = 1e-12);
        assert_relative_eq!(soe.eigenvalue(1), 5.0, epsilon = 1e-12);

        let x = soe.eigenvector(0);
        assert_relative_eq!(2.0 * x[0] * x[0] + x[1] * x[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn rcond_of_zero_matrix_is_zero() {
        let mut soe = DenseEigenSoe::new(2);
        assert_eq!(soe.rcond(), Ok(0.0));

        soe.add_a(&[Some(0), Some(1)], array![[4.0, 0.0], [0.0, 1.0]].view(), 1.0);
        assert_relative_eq!(soe.rcond().expect("converges"), 0.25);
    }

    #[test]
    fn rejects_invalid_mass_and_mode_count() {
        let mut soe = DenseEigenSoe::new(2);
        soe.add_a(&[Some(0), Some(1)], Array2::eye(2).view(), 1.0);

        assert_eq!(
            soe.solve(3, Which::SmallestMagnitude),
            Err(EigenError::InvalidModeCount {
                requested: 3,
                available: 2
            })
        );
        assert_eq!(
            soe.solve(1, Which::SmallestMagnitude),
            Err(EigenError::NonPositiveMass { eq: 0 })
        );

        soe.add_m(&[Some(0), Some(1)], array![[1.0, 0.5], [0.5, 1.0]].view(), 1.0);
        assert_eq!(
            soe.solve(1, Which::SmallestMagnitude),
            Err(EigenError::NonDiagonalMass)
        );
    }
}
