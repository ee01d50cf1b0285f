//! Dense reference systems of equations backed by `nalgebra`.
//!
//! The solvers only talk to the [`LinearSoe`] and [`EigenSoe`] contracts from
//! `strut-core`. The types here are small dense implementations of those
//! contracts, suitable for tests, demos, and models with a few hundred
//! equations. Production kernels (banded, sparse, shift-invert Lanczos) plug
//! in through the same traits.
//!
//! [`LinearSoe`]: strut_core::LinearSoe
//! [`EigenSoe`]: strut_core::EigenSoe

mod assemble;
mod dense_eigen;
mod dense_soe;

pub use dense_eigen::{DenseEigenSoe, EigenError};
pub use dense_soe::{DenseSoe, SoeError};
