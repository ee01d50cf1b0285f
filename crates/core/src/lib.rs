//! Core contracts for the Strut equilibrium solvers.
//!
//! This crate defines the collaborator boundaries that the solvers in
//! `strut-solvers` drive, without fixing any concrete element library or
//! factorization kernel:
//!
//! - [`StructuralModel`] the finite-element model: element tangents and
//!   resisting forces, a reference load pattern, and a rollback-able trial
//!   displacement state
//! - [`MatrixSystem`], [`LinearSoe`], [`EigenSoe`] systems of equations the
//!   solvers assemble into and solve
//! - [`Observer`] receives solver events and optionally returns control actions
//! - [`EigenPair`], [`Which`] eigen-analysis results and spectrum selection

mod eigen;
mod model;
mod observer;
mod soe;

pub use eigen::{EigenPair, Which};
pub use model::StructuralModel;
pub use observer::Observer;
pub use soe::{EigenSoe, LinearSoe, MatrixSystem};
