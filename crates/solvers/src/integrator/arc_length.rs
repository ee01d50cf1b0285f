use ndarray::Array1;
use strut_core::{LinearSoe, StructuralModel};
use thiserror::Error;

use super::{Error, assemble};

/// Which arc-length constraint the corrector enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Constraint {
    /// `‖ΔU‖² + α² Δλ² = Δs²` enforced exactly at every iteration.
    #[default]
    Spherical,

    /// Corrections orthogonal to the accumulated step increment.
    NormalPlane,
}

/// How the spherical corrector picks one of the two roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum RootSelection {
    /// The first root if it keeps the step increment pointing forward
    /// (`ΔU_step · ΔU_new > 0`), otherwise the second.
    #[default]
    PositiveIncrementProduct,

    /// The root whose corrected step increment has the larger projection on
    /// the current step increment.
    MaximumIncrementProduct,
}

/// How the predictor chooses the direction of a new step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum PredictorSign {
    /// Same sign as the previous converged step's `Δλ`.
    ///
    /// Simple, but reverses at a limit point and retraces the path.
    #[default]
    PreviousStep,

    /// Sign of `Ûh · ΔU_prev + α² Δλ_prev`, continuing in the direction of
    /// the previous converged step in the scaled `(U, λ)` space.
    ///
    /// Follows the path through load limit points.
    IncrementProjection,
}

/// Configuration for [`ArcLength`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Config {
    arc_length: f64,
    alpha: f64,
    constraint: Constraint,
    root_selection: RootSelection,
    predictor_sign: PredictorSign,
}

/// Errors that can occur when validating an arc-length config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("arc length must be finite and positive")]
    ArcLength,

    #[error("alpha must be finite and non-negative")]
    Alpha,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arc_length: 0.1,
            alpha: 1.0,
            constraint: Constraint::Spherical,
            root_selection: RootSelection::PositiveIncrementProduct,
            predictor_sign: PredictorSign::PreviousStep,
        }
    }
}

impl Config {
    /// Creates a spherical arc-length config with the default strategies.
    ///
    /// `alpha` scales the load factor against displacements in the
    /// constraint; zero gives a pure displacement arc length.
    ///
    /// # Errors
    ///
    /// Returns an error if `arc_length` is not positive or `alpha` is
    /// negative, or if either is non-finite.
    pub fn new(arc_length: f64, alpha: f64) -> Result<Self, ConfigError> {
        let config = Self {
            arc_length,
            alpha,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_constraint(self, constraint: Constraint) -> Self {
        Self { constraint, ..self }
    }

    #[must_use]
    pub fn with_root_selection(self, root_selection: RootSelection) -> Self {
        Self {
            root_selection,
            ..self
        }
    }

    #[must_use]
    pub fn with_predictor_sign(self, predictor_sign: PredictorSign) -> Self {
        Self {
            predictor_sign,
            ..self
        }
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.arc_length.is_finite() || self.arc_length <= 0.0 {
            return Err(ConfigError::ArcLength);
        }
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(ConfigError::Alpha);
        }
        Ok(())
    }

    #[must_use]
    pub fn arc_length(&self) -> f64 {
        self.arc_length
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[must_use]
    pub fn constraint(&self) -> Constraint {
        self.constraint
    }

    #[must_use]
    pub fn root_selection(&self) -> RootSelection {
        self.root_selection
    }

    #[must_use]
    pub fn predictor_sign(&self) -> PredictorSign {
        self.predictor_sign
    }
}

/// Per-instance vectors, sized by `initialize`.
#[derive(Debug, Clone)]
struct Workspace {
    /// Displacement for a unit load, `K⁻¹ P`.
    u_hat: Array1<f64>,

    /// Newton correction for the current unbalance, `K⁻¹ R`.
    u_bar: Array1<f64>,

    /// Increment applied by the latest update.
    delta: Array1<f64>,

    /// Displacement accumulated over the current step.
    step_disp: Array1<f64>,

    /// Displacement of the last converged step.
    prev_disp: Array1<f64>,

    load: Array1<f64>,
}

/// Continuation along the equilibrium path with a fixed arc length.
///
/// Each step starts from a tangent predictor of length `Δs` in the scaled
/// `(U, λ)` space. Every correction then adjusts the load factor so the
/// accumulated step increment stays on the constraint surface, which lets the
/// load factor decrease past limit points.
#[derive(Debug, Clone)]
pub struct ArcLength {
    config: Config,
    lambda: f64,
    committed_lambda: f64,
    step_lambda: f64,
    prev_lambda: f64,
    has_prev: bool,
    workspace: Option<Workspace>,
}

impl ArcLength {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            lambda: 0.0,
            committed_lambda: 0.0,
            step_lambda: 0.0,
            prev_lambda: 0.0,
            has_prev: false,
            workspace: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Squared norm of the displacement accumulated in the current step and
    /// the accumulated load-factor increment, `(‖ΔU_step‖², Δλ_step)`.
    ///
    /// Returns `None` before initialization.
    #[must_use]
    pub fn step_increment(&self) -> Option<(f64, f64)> {
        let ws = self.workspace.as_ref()?;
        Some((ws.step_disp.dot(&ws.step_disp), self.step_lambda))
    }

    pub(super) fn initialize(&mut self, num_eqn: usize) {
        self.workspace = Some(Workspace {
            u_hat: Array1::zeros(num_eqn),
            u_bar: Array1::zeros(num_eqn),
            delta: Array1::zeros(num_eqn),
            step_disp: Array1::zeros(num_eqn),
            prev_disp: Array1::zeros(num_eqn),
            load: Array1::zeros(num_eqn),
        });
    }

    pub(super) fn new_step<M, S>(&mut self, model: &mut M, soe: &mut S) -> Result<(), Error>
    where
        M: StructuralModel,
        S: LinearSoe,
    {
        let ws = self.workspace.as_mut().ok_or(Error::NotInitialized)?;
        self.config.validate().map_err(Error::invalid_config)?;
        let alpha2 = self.config.alpha().powi(2);

        assemble::form_tangent(model, soe)?;
        assemble::solve_reference(model, soe, &mut ws.u_hat)?;

        let sign = match self.config.predictor_sign() {
            PredictorSign::PreviousStep if self.has_prev => self.prev_lambda.signum(),
            PredictorSign::IncrementProjection if self.has_prev => {
                let projection = ws.u_hat.dot(&ws.prev_disp) + alpha2 * self.prev_lambda;
                if projection < 0.0 { -1.0 } else { 1.0 }
            }
            _ => 1.0,
        };

        let d_lambda =
            sign * self.config.arc_length() / (ws.u_hat.dot(&ws.u_hat) + alpha2).sqrt();

        ws.delta.assign(&ws.u_hat);
        ws.delta *= d_lambda;
        ws.step_disp.assign(&ws.delta);
        self.step_lambda = d_lambda;
        self.lambda += d_lambda;

        model.incr_disp(ws.delta.view()).map_err(Error::model)?;
        soe.set_x(ws.delta.view());

        log::debug!("arc length predictor: λ = {} (Δλ = {d_lambda})", self.lambda);
        Ok(())
    }

    pub(super) fn form_unbalance<M, S>(&mut self, model: &M, soe: &mut S) -> Result<(), Error>
    where
        M: StructuralModel,
        S: LinearSoe,
    {
        let ws = self.workspace.as_mut().ok_or(Error::NotInitialized)?;
        assemble::form_unbalance(model, soe, self.lambda, &mut ws.load)
    }

    pub(super) fn update<M, S>(&mut self, model: &mut M, soe: &mut S) -> Result<(), Error>
    where
        M: StructuralModel,
        S: LinearSoe,
    {
        let ws = self.workspace.as_mut().ok_or(Error::NotInitialized)?;

        ws.u_bar.assign(&soe.x());
        assemble::solve_reference(model, soe, &mut ws.u_hat)?;

        let (config, step_lambda) = (&self.config, self.step_lambda);
        let d_lambda = match config.constraint() {
            Constraint::Spherical => spherical_correction(config, ws, step_lambda)?,
            Constraint::NormalPlane => normal_plane_correction(config, ws, step_lambda)?,
        };

        ws.delta.assign(&ws.u_hat);
        ws.delta *= d_lambda;
        ws.delta += &ws.u_bar;
        ws.step_disp += &ws.delta;
        self.step_lambda += d_lambda;
        self.lambda += d_lambda;

        model.incr_disp(ws.delta.view()).map_err(Error::model)?;
        soe.set_x(ws.delta.view());
        Ok(())
    }

    pub(super) fn commit(&mut self) {
        self.committed_lambda = self.lambda;
        if let Some(ws) = self.workspace.as_mut() {
            ws.prev_disp.assign(&ws.step_disp);
            self.prev_lambda = self.step_lambda;
            self.has_prev = true;
        }
    }

    pub(super) fn revert(&mut self) {
        self.lambda = self.committed_lambda;
        self.step_lambda = 0.0;
        if let Some(ws) = self.workspace.as_mut() {
            ws.step_disp.fill(0.0);
        }
    }

    pub(super) fn load_factor(&self) -> f64 {
        self.lambda
    }
}

/// Solves the spherical constraint for the load correction `δλ`.
///
/// Requires `‖ΔU_step + Ûb + δλ Ûh‖² + α² (Δλ_step + δλ)² = Δs²`, a quadratic
/// `a δλ² + b δλ + c = 0`. The constant term keeps the current constraint
/// residual so the surface is re-targeted exactly every iteration.
fn spherical_correction(
    config: &Config,
    ws: &Workspace,
    step_lambda: f64,
) -> Result<f64, Error> {
    let alpha2 = config.alpha().powi(2);
    let ds2 = config.arc_length().powi(2);
    let (u_hat, u_bar, step) = (&ws.u_hat, &ws.u_bar, &ws.step_disp);

    let hh = u_hat.dot(u_hat);
    let hb = u_hat.dot(u_bar);
    let sh = step.dot(u_hat);
    let sb = step.dot(u_bar);
    let ss = step.dot(step);
    let bb = u_bar.dot(u_bar);

    let a = alpha2 + hh;
    let b = 2.0 * (alpha2 * step_lambda + hb + sh);
    let c = 2.0 * sb + bb + (ss + alpha2 * step_lambda * step_lambda - ds2);

    if a.abs() <= f64::EPSILON * (b.abs() + c.abs()) {
        if b == 0.0 {
            return Err(Error::ZeroDenominator);
        }
        log::warn!("arc length quadratic is degenerate (a = {a:e}); using the linear root");
        return Ok(-c / b);
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Err(Error::ComplexRoots { discriminant });
    }

    let sqrt_d = discriminant.sqrt();
    let root1 = (-b + sqrt_d) / (2.0 * a);
    let root2 = (-b - sqrt_d) / (2.0 * a);

    // Projection of the corrected step increment on the current one.
    let forward = |root: f64| ss + sb + root * sh;

    Ok(match config.root_selection() {
        RootSelection::PositiveIncrementProduct => {
            if forward(root1) > 0.0 { root1 } else { root2 }
        }
        RootSelection::MaximumIncrementProduct => {
            if forward(root1) >= forward(root2) { root1 } else { root2 }
        }
    })
}

/// Solves the linearized normal-plane condition for `δλ`.
fn normal_plane_correction(
    config: &Config,
    ws: &Workspace,
    step_lambda: f64,
) -> Result<f64, Error> {
    let alpha2 = config.alpha().powi(2);
    let denominator = ws.step_disp.dot(&ws.u_hat) + alpha2 * step_lambda;
    if denominator == 0.0 {
        return Err(Error::ZeroDenominator);
    }
    Ok(-ws.step_disp.dot(&ws.u_bar) / denominator)
}

/// Squared distance of the step increment from the constraint surface.
#[cfg(test)]
pub(super) fn constraint_residual(arc: &ArcLength) -> Option<f64> {
    let (ss, dl) = arc.step_increment()?;
    let alpha2 = arc.config.alpha().powi(2);
    Some(ss + alpha2 * dl * dl - arc.config.arc_length().powi(2))
}
