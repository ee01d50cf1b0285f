//! Interactive visualizations of Strut solvers.
//!
//! Each mode runs a small analysis on a single nonlinear spring and opens a
//! plot window showing what the solver did.
//!
//! # Usage
//!
//! ```text
//! cargo run --example plot --features plot -- path
//! cargo run --example plot --features plot -- path 0.02
//! cargo run --example plot --features plot -- newton
//! ```
//!
//! # Modes
//!
//! - **path [ds]**: trace the equilibrium path of a shallow two-bar truss
//!   with arc-length continuation. The load factor climbs to the limit point
//!   at λ ≈ 0.192, falls through zero while the truss snaps through, and rises
//!   again once the bars are in tension. Smaller arc lengths (`0.02`) give a
//!   smoother curve; larger ones (`0.1`) show how coarse the steps can be.
//!
//! - **newton**: apply a load of 10 to a hardening spring `u + u³` in a single
//!   step and plot the convergence metric per iteration on a log scale, with
//!   and without a line search.

use std::{convert::Infallible, error::Error};

use ndarray::{Array1, Array2, ArrayView1, array};
use strut_core::StructuralModel;
use strut_observers::{PlotObserver, ShowConfig};
use strut_solvers::{
    ArcLength, ConvergenceTest, LoadControl, NewtonRaphson, StaticAnalysis,
    algorithm::newton::{self, LineSearch, Method},
    convergence::{self, Kind},
    integrator::{arc_length, load_control},
    linalg::DenseSoe,
};

fn main() -> Result<(), Box<dyn Error>> {
    let mode = std::env::args().nth(1).unwrap_or_else(|| "path".into());
    match mode.as_str() {
        "path" => {
            let ds = std::env::args()
                .nth(2)
                .as_deref()
                .map(str::parse::<f64>)
                .transpose()
                .unwrap_or_else(|_| {
                    eprintln!("Invalid arc length: expected a number, e.g. 0.05");
                    std::process::exit(1);
                })
                .unwrap_or(0.05);
            path(ds)
        }
        "newton" => newton_history(),
        other => {
            eprintln!("Unknown mode: {other}");
            eprintln!("Usage: plot [path [ds]|newton]");
            std::process::exit(1);
        }
    }
}

/// A one-freedom spring with a nonlinear force-displacement law.
struct Spring {
    force: fn(f64) -> f64,
    stiffness: fn(f64) -> f64,
    dofs: [Option<usize>; 1],
    load: Array1<f64>,
    disp: Array1<f64>,
    committed: Array1<f64>,
}

impl Spring {
    fn new(force: fn(f64) -> f64, stiffness: fn(f64) -> f64, load: f64) -> Self {
        Self {
            force,
            stiffness,
            dofs: [Some(0)],
            load: array![load],
            disp: Array1::zeros(1),
            committed: Array1::zeros(1),
        }
    }

    /// Shallow two-bar truss in normalized form, `u (u - 1) (u - 2) / 2`.
    fn two_bar_truss() -> Self {
        Self::new(
            |u| u - 1.5 * u * u + 0.5 * u.powi(3),
            |u| 1.0 - 3.0 * u + 1.5 * u * u,
            1.0,
        )
    }

    fn hardening() -> Self {
        Self::new(|u| u + u.powi(3), |u| 1.0 + 3.0 * u * u, 10.0)
    }
}

impl StructuralModel for Spring {
    type Error = Infallible;

    fn num_eqn(&self) -> usize {
        1
    }

    fn num_elements(&self) -> usize {
        1
    }

    fn element_dofs(&self, _e: usize) -> &[Option<usize>] {
        &self.dofs
    }

    fn element_tangent(&self, _e: usize) -> Result<Array2<f64>, Infallible> {
        Ok(array![[(self.stiffness)(self.disp[0])]])
    }

    fn element_resisting_force(&self, _e: usize) -> Result<Array1<f64>, Infallible> {
        Ok(array![(self.force)(self.disp[0])])
    }

    fn reference_load(&self) -> ArrayView1<'_, f64> {
        self.load.view()
    }

    fn disp(&self) -> ArrayView1<'_, f64> {
        self.disp.view()
    }

    fn set_disp(&mut self, disp: ArrayView1<'_, f64>) -> Result<(), Infallible> {
        self.disp.assign(&disp);
        Ok(())
    }

    fn incr_disp(&mut self, delta: ArrayView1<'_, f64>) -> Result<(), Infallible> {
        self.disp += &delta;
        Ok(())
    }

    fn commit_state(&mut self) -> Result<(), Infallible> {
        self.committed.assign(&self.disp);
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> Result<(), Infallible> {
        self.disp.assign(&self.committed);
        Ok(())
    }
}

fn test(max_iters: usize) -> Result<ConvergenceTest, Box<dyn Error>> {
    let config = convergence::Config::new(Kind::NormUnbalance, 1e-10, max_iters)?;
    Ok(ConvergenceTest::new(config))
}

// --- Path --------------------------------------------------------------------

/// Trace the snap-through path of the two-bar truss and plot λ against u.
fn path(ds: f64) -> Result<(), Box<dyn Error>> {
    let config = arc_length::Config::new(ds, 1.0)?
        .with_predictor_sign(arc_length::PredictorSign::IncrementProjection);

    let mut analysis: StaticAnalysis<Spring> = StaticAnalysis::new()
        .with_model(Spring::two_bar_truss())
        .with_integrator(ArcLength::new(config))
        .with_algorithm(NewtonRaphson::default())
        .with_test(test(20)?)
        .with_soe(DenseSoe::new(1));

    let mut obs = PlotObserver::<2>::new(["Arc length", "Exact"]);
    obs.record(0.0, [Some(0.0), None]);

    let max_steps = (4.0 / ds).ceil() as usize;
    for _ in 0..max_steps {
        let solution = analysis.analyze_unobserved(1)?;
        let u = analysis.model().map_or(f64::NAN, |m| m.disp()[0]);
        obs.record(u, [Some(solution.load_factor), None]);
        if u > 2.8 {
            break;
        }
    }

    for i in 0..=280 {
        let u = f64::from(i) * 0.01;
        obs.record(u, [None, Some(u - 1.5 * u * u + 0.5 * u.powi(3))]);
    }

    obs.show(
        ShowConfig::new()
            .title(format!("Two-bar truss snap-through (Δs = {ds})"))
            .x_label("u")
            .y_label("λ")
            .legend()
            .markers(),
    )?;

    Ok(())
}

// --- Newton ------------------------------------------------------------------

/// Solve one load step with and without a line search and compare the
/// convergence histories.
fn newton_history() -> Result<(), Box<dyn Error>> {
    let mut obs = PlotObserver::<2>::new(["Full Newton", "Secant line search"]);

    let runs = [
        newton::Config::default(),
        newton::Config::with_line_search(LineSearch::with_method(Method::Secant)),
    ];

    for (trace, config) in runs.into_iter().enumerate() {
        let mut analysis: StaticAnalysis<Spring> = StaticAnalysis::new()
            .with_model(Spring::hardening())
            .with_integrator(LoadControl::new(load_control::Config::constant(1.0)?))
            .with_algorithm(NewtonRaphson::new(config))
            .with_test(test(50)?)
            .with_soe(DenseSoe::new(1));

        let mut record = |event: &newton::Event| -> Option<newton::Action> {
            let mut slots = [None, None];
            slots[trace] = Some(event.norm);
            obs.record(event.iter as f64, slots);
            None
        };
        analysis.analyze(1, &mut record)?;
    }

    obs.show(
        ShowConfig::new()
            .title("Hardening spring u + u³ = 10")
            .x_label("iteration")
            .y_label("‖R‖")
            .legend()
            .log_y()
            .markers(),
    )?;

    Ok(())
}
