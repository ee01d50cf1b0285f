//! Plotting observer for convergence histories and equilibrium paths.
//!
//! See [`PlotObserver`] and [`Plottable`] for usage.

use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};
use strut_core::Observer;
use strut_solvers::algorithm::newton;

/// Rendering options for a [`PlotObserver`] window.
///
/// # Example
///
/// ```ignore
/// obs.show(ShowConfig::new().title("Newton").legend().log_y())?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShowConfig {
    title: Option<String>,
    x_label: Option<String>,
    y_label: Option<String>,
    legend: bool,
    log_y: bool,
    markers: bool,
}

impl ShowConfig {
    /// Creates a config with no title, no legend, and linear axes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = Some(label.into());
        self
    }

    /// Labels each trace by name.
    #[must_use]
    pub fn legend(mut self) -> Self {
        self.legend = true;
        self
    }

    /// Plots `log₁₀ y`, skipping non-positive values.
    #[must_use]
    pub fn log_y(mut self) -> Self {
        self.log_y = true;
        self
    }

    /// Draws a marker at every recorded point.
    #[must_use]
    pub fn markers(mut self) -> Self {
        self.markers = true;
        self
    }
}

/// Extracts plottable data from a solver event.
///
/// Return `None` from [`x`][Plottable::x] to skip the event entirely, or
/// `None` in a trace slot to skip only that trace.
pub trait Plottable<const N: usize> {
    /// The x-axis value for this event.
    fn x(&self) -> Option<f64>;

    /// The y-axis values for each trace.
    fn traces(&self) -> [Option<f64>; N];
}

/// Newton iterations plot against the iteration number, tracing the
/// convergence metric and the line-search step scale.
///
/// Iteration numbers restart every step, so a multi-step run overlays the
/// convergence history of each step.
impl Plottable<2> for newton::Event {
    fn x(&self) -> Option<f64> {
        u32::try_from(self.iter).ok().map(f64::from)
    }

    fn traces(&self) -> [Option<f64>; 2] {
        [Some(self.norm), self.eta]
    }
}

/// An observer that collects trace data during an analysis and displays it
/// in an egui window.
///
/// The const generic `N` is the number of traces. Pass `&mut PlotObserver`
/// to an analysis whose events implement [`Plottable<N>`][Plottable], or
/// call [`record`][PlotObserver::record] from your own loop, for example to
/// trace the equilibrium path between calls to `analyze`.
///
/// # Example
///
/// ```ignore
/// let mut obs = PlotObserver::<2>::new(["Norm", "η"]);
/// analysis.analyze(10, &mut obs)?;
/// obs.show(ShowConfig::new().title("Newton").legend().log_y())?;
/// ```
pub struct PlotObserver<const N: usize> {
    names: [String; N],
    data: [Vec<[f64; 2]>; N],
}

impl<const N: usize> PlotObserver<N> {
    /// Creates an observer with the given trace names.
    pub fn new(names: [&str; N]) -> Self {
        Self {
            names: names.map(str::to_owned),
            data: std::array::from_fn(|_| Vec::new()),
        }
    }

    /// Records one point for every trace whose slot is `Some`.
    pub fn record(&mut self, x: f64, traces: [Option<f64>; N]) {
        for (points, y) in self.data.iter_mut().zip(traces) {
            if let Some(y) = y {
                points.push([x, y]);
            }
        }
    }

    /// Number of points recorded for trace `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= N`.
    #[must_use]
    pub fn len(&self, i: usize) -> usize {
        self.data[i].len()
    }

    /// Returns `true` if no trace has any points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(Vec::is_empty)
    }

    /// Opens a blocking egui window with every collected trace.
    ///
    /// # Errors
    ///
    /// Returns an error if the native window cannot be created.
    pub fn show(self, config: ShowConfig) -> Result<(), eframe::Error> {
        let title = config.title.clone().unwrap_or_default();
        let traces: Vec<(String, Vec<[f64; 2]>)> = self.names.into_iter().zip(self.data).collect();

        eframe::run_native(
            &title,
            eframe::NativeOptions::default(),
            Box::new(move |_cc| Ok(Box::new(PlotApp { traces, config }))),
        )
    }
}

impl<const N: usize, E, A> Observer<E, A> for PlotObserver<N>
where
    E: Plottable<N>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        if let Some(x) = event.x() {
            self.record(x, event.traces());
        }
        None
    }
}

struct PlotApp {
    traces: Vec<(String, Vec<[f64; 2]>)>,
    config: ShowConfig,
}

impl PlotApp {
    fn points(&self, points: &[[f64; 2]]) -> Vec<[f64; 2]> {
        if self.config.log_y {
            points
                .iter()
                .filter(|p| p[1] > 0.0)
                .map(|p| [p[0], p[1].log10()])
                .collect()
        } else {
            points.to_vec()
        }
    }
}

impl eframe::App for PlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let mut plot = Plot::new("strut_plot");
            if self.config.legend {
                plot = plot.legend(Legend::default());
            }
            if let Some(label) = &self.config.x_label {
                plot = plot.x_axis_label(label.clone());
            }
            match (&self.config.y_label, self.config.log_y) {
                (Some(label), true) => plot = plot.y_axis_label(format!("log₁₀ {label}")),
                (Some(label), false) => plot = plot.y_axis_label(label.clone()),
                (None, true) => plot = plot.y_axis_label("log₁₀"),
                (None, false) => {}
            }

            plot.show(ui, |plot_ui| {
                for (name, points) in &self.traces {
                    let points = self.points(points);
                    if self.config.markers {
                        plot_ui.points(
                            Points::new(PlotPoints::from(points.clone())).name(name).radius(2.5),
                        );
                    }
                    plot_ui.line(Line::new(PlotPoints::from(points)).name(name));
                }
            });
        });
    }
}
