//! Reusable observers for the Strut equilibrium solvers.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! work with any solver event exposing the right data.
//!
//! # Modules
//!
//! - [`traits`]: capability traits for cross-solver observers
//!   ([`HasNorm`], [`HasLoadFactor`], [`CanStopEarly`])
//!
//! # Observers
//!
//! - [`LogObserver`] forwards every event to the `log` facade
//! - [`DivergenceGuard`] stops a step once the metric blows up
//!
//! # Features
//!
//! - `plot`: enables [`PlotObserver`] for visualizing solver behavior via egui.
//!   This feature adds dependencies on `eframe` and `egui_plot`.
//!
//! [`Observer`]: strut_core::Observer
//! [`HasNorm`]: traits::HasNorm
//! [`HasLoadFactor`]: traits::HasLoadFactor
//! [`CanStopEarly`]: traits::CanStopEarly

pub mod traits;

mod guard;
mod logging;

#[cfg(feature = "plot")]
mod plot;

pub use guard::DivergenceGuard;
pub use logging::LogObserver;

#[cfg(feature = "plot")]
pub use plot::{PlotObserver, Plottable, ShowConfig};
