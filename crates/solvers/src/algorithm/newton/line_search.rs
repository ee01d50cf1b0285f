//! Line searches that rescale a Newton step.
//!
//! With `s(η) = ΔU · R(U + η ΔU)`, a search looks for a scale `η` where the
//! unbalance is orthogonal to the step, `s(η) ≈ 0`. Each trial moves the
//! model by the difference from the previous trial scale rather than
//! restoring a snapshot, then reforms the unbalance.

use ndarray::Array1;
use strut_core::{LinearSoe, StructuralModel};

use crate::{algorithm::Error, integrator::LoadControl};

use super::ConfigError;

/// How the next trial scale is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Method {
    /// Bracket a sign change by doubling `η`, then bisect.
    #[default]
    Bisection,

    /// Bracket like bisection, then interpolate linearly between the ends.
    RegulaFalsi,

    /// Secant steps through the last two trials.
    Secant,

    /// Interpolate each trial against the initial slope `s(0)`.
    InitialInterpolated,
}

/// Line search settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct LineSearch {
    method: Method,
    tolerance: f64,
    max_iters: usize,
    min_eta: f64,
    max_eta: f64,
    verbose: bool,
}

impl Default for LineSearch {
    fn default() -> Self {
        Self {
            method: Method::Bisection,
            tolerance: 0.8,
            max_iters: 10,
            min_eta: 0.1,
            max_eta: 10.0,
            verbose: false,
        }
    }
}

impl LineSearch {
    /// Creates a line search.
    ///
    /// A trial scale is accepted once `|s(η) / s(0)|` falls below
    /// `tolerance`. Trial scales stay within `[min_eta, max_eta]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `tolerance` is not finite and positive,
    /// `max_iters` is zero, or the bounds do not satisfy
    /// `0 < min_eta <= 1 <= max_eta`.
    pub fn new(
        method: Method,
        tolerance: f64,
        max_iters: usize,
        min_eta: f64,
        max_eta: f64,
    ) -> Result<Self, ConfigError> {
        let line_search = Self {
            method,
            tolerance,
            max_iters,
            min_eta,
            max_eta,
            verbose: false,
        };
        line_search.validate()?;
        Ok(line_search)
    }

    /// Creates a line search with the default settings for `method`.
    #[must_use]
    pub fn with_method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Logs every trial when `verbose` is set.
    #[must_use]
    pub fn with_verbose(self, verbose: bool) -> Self {
        Self { verbose, ..self }
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigError::Tolerance);
        }
        if self.max_iters == 0 {
            return Err(ConfigError::MaxIters);
        }
        let bounds_ok = self.min_eta > 0.0
            && self.min_eta <= 1.0
            && self.max_eta >= 1.0
            && self.max_eta.is_finite();
        if !bounds_ok {
            return Err(ConfigError::EtaBounds);
        }
        Ok(())
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    #[must_use]
    pub fn min_eta(&self) -> f64 {
        self.min_eta
    }

    #[must_use]
    pub fn max_eta(&self) -> f64 {
        self.max_eta
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Trial moves along a fixed Newton step `dx`.
struct Trial<'a, M, S> {
    model: &'a mut M,
    integrator: &'a mut LoadControl,
    soe: &'a mut S,
    dx: &'a Array1<f64>,
    delta: &'a mut Array1<f64>,
    eta: f64,
    trials: usize,
}

impl<M, S> Trial<'_, M, S>
where
    M: StructuralModel,
    S: LinearSoe,
{
    /// Moves the model to `U₀ + η dx`, reforms the unbalance, and returns
    /// `s(η)`.
    fn move_to(&mut self, eta: f64) -> Result<f64, Error> {
        self.delta.assign(self.dx);
        *self.delta *= eta - self.eta;
        self.integrator
            .shift_trial(self.model, self.delta.view())
            .map_err(Error::Update)?;
        self.integrator
            .form_unbalance(self.model, self.soe)
            .map_err(Error::Assembly)?;
        self.eta = eta;
        self.trials += 1;
        Ok(self.dx.dot(&self.soe.b()))
    }
}

/// Rescales the step `dx` already applied to the model and returns the
/// accepted scale `η`.
///
/// On entry the model sits at `U₀ + dx` with the unbalance formed there, and
/// `s0`, `s1` are `s(0)` and `s(1)`. On return the model sits at `U₀ + η dx`,
/// the unbalance is formed there, and `X` holds `η dx`.
#[allow(clippy::too_many_arguments)]
pub(super) fn search<M, S>(
    config: &LineSearch,
    s0: f64,
    s1: f64,
    model: &mut M,
    integrator: &mut LoadControl,
    soe: &mut S,
    dx: &Array1<f64>,
    delta: &mut Array1<f64>,
) -> Result<f64, Error>
where
    M: StructuralModel,
    S: LinearSoe,
{
    if s0 == 0.0 {
        log::warn!("line search skipped: zero initial slope");
        return Ok(1.0);
    }

    let r0 = (s1 / s0).abs();
    if r0 <= config.tolerance {
        return Ok(1.0);
    }

    let mut trial = Trial {
        model,
        integrator,
        soe: &mut *soe,
        dx,
        delta: &mut *delta,
        eta: 1.0,
        trials: 0,
    };

    let eta = match config.method {
        Method::Bisection | Method::RegulaFalsi => bracketed(config, s0, s1, &mut trial)?,
        Method::Secant => secant(config, s0, s1, &mut trial)?,
        Method::InitialInterpolated => initial_interpolated(config, s0, s1, r0, &mut trial)?,
    };

    let trials = trial.trials;
    delta.assign(dx);
    *delta *= eta;
    soe.set_x(delta.view());

    if config.verbose {
        log::info!("line search ({:?}): η = {eta} after {trials} trials", config.method);
    }
    Ok(eta)
}

fn bracketed<M, S>(
    config: &LineSearch,
    s0: f64,
    s1: f64,
    trial: &mut Trial<'_, M, S>,
) -> Result<f64, Error>
where
    M: StructuralModel,
    S: LinearSoe,
{
    let (mut eta_l, mut s_l) = (0.0, s0);
    let (mut eta_u, mut s_u) = (1.0, s1);

    while s_u * s0 > 0.0 && eta_u < config.max_eta {
        eta_u = (2.0 * eta_u).min(config.max_eta);
        s_u = trial.move_to(eta_u)?;
        log_trial(config, eta_u, s_u, s0);
    }

    if s_u * s0 > 0.0 {
        log::warn!(
            "line search found no sign change up to η = {}; taking the full step",
            config.max_eta
        );
        trial.move_to(1.0)?;
        return Ok(1.0);
    }

    let mut eta = eta_u;
    for _ in 0..config.max_iters {
        eta = match config.method {
            Method::RegulaFalsi => eta_u - s_u * (eta_l - eta_u) / (s_l - s_u),
            _ => 0.5 * (eta_l + eta_u),
        };
        let s = trial.move_to(eta)?;
        log_trial(config, eta, s, s0);

        if (s / s0).abs() < config.tolerance {
            break;
        }
        if s * s_u < 0.0 {
            (eta_l, s_l) = (eta, s);
        } else {
            (eta_u, s_u) = (eta, s);
        }
    }
    Ok(eta)
}

fn secant<M, S>(
    config: &LineSearch,
    s0: f64,
    s1: f64,
    trial: &mut Trial<'_, M, S>,
) -> Result<f64, Error>
where
    M: StructuralModel,
    S: LinearSoe,
{
    let (mut eta_prev, mut s_prev) = (0.0, s0);
    let (mut eta, mut s) = (1.0, s1);

    for _ in 0..config.max_iters {
        if s == s_prev {
            break;
        }
        let next = eta - s * (eta_prev - eta) / (s_prev - s);
        let next = next.clamp(config.min_eta, config.max_eta);
        (eta_prev, s_prev) = (eta, s);
        eta = next;
        s = trial.move_to(eta)?;
        log_trial(config, eta, s, s0);

        if (s / s0).abs() < config.tolerance {
            break;
        }
    }
    Ok(eta)
}

fn initial_interpolated<M, S>(
    config: &LineSearch,
    s0: f64,
    s1: f64,
    r0: f64,
    trial: &mut Trial<'_, M, S>,
) -> Result<f64, Error>
where
    M: StructuralModel,
    S: LinearSoe,
{
    let (mut eta, mut s) = (1.0, s1);

    for _ in 0..config.max_iters {
        if s == s0 {
            break;
        }
        let mut next = eta * s0 / (s0 - s);
        if (s / s0).abs() > r0 {
            next = 1.0;
        }
        eta = next.clamp(config.min_eta, config.max_eta);
        s = trial.move_to(eta)?;
        log_trial(config, eta, s, s0);

        if (s / s0).abs() < config.tolerance {
            break;
        }
    }
    Ok(eta)
}

fn log_trial(config: &LineSearch, eta: f64, s: f64, s0: f64) {
    if config.verbose {
        log::info!("line search: η = {eta}, |s/s0| = {:e}", (s / s0).abs());
    }
}
