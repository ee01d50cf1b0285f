//! Static analysis: the outer loop over load steps.
//!
//! A [`StaticAnalysis`] owns every collaborator of an incremental analysis
//! and runs `new_step`, the solution algorithm, and `commit` for each step.
//! A step that fails is reverted to the last committed state and its error is
//! logged and returned; cutting the increment and retrying is up to the
//! caller.
//!
//! Successive calls to [`StaticAnalysis::analyze`] continue from the last
//! committed state, numbering steps consecutively.

mod error;
mod solution;


pub use error::Error;
pub use solution::{Solution, Status};

use strut_core::{EigenSoe, LinearSoe, Observer, StructuralModel};

use crate::{
    algorithm::{Algorithm, Context, newton},
    convergence::ConvergenceTest,
    integrator::Integrator,
    linalg::{DenseEigenSoe, DenseSoe},
};

/// An incremental static analysis, assembled from its components.
///
/// Every component except the eigen system is required. The eigen system is
/// only used by the ill-conditioning detector.
#[derive(Debug, Clone)]
pub struct StaticAnalysis<M, S = DenseSoe, E = DenseEigenSoe> {
    model: Option<M>,
    integrator: Option<Integrator>,
    algorithm: Option<Algorithm>,
    test: Option<ConvergenceTest>,
    soe: Option<S>,
    eigen: Option<E>,
    initialized: bool,
    committed_steps: usize,
}

impl<M, S, E> Default for StaticAnalysis<M, S, E> {
    fn default() -> Self {
        Self {
            model: None,
            integrator: None,
            algorithm: None,
            test: None,
            soe: None,
            eigen: None,
            initialized: false,
            committed_steps: 0,
        }
    }
}

impl<M, S, E> StaticAnalysis<M, S, E>
where
    M: StructuralModel,
    S: LinearSoe,
    E: EigenSoe,
{
    /// Creates an analysis with no components.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_model(mut self, model: M) -> Self {
        self.model = Some(model);
        self.initialized = false;
        self
    }

    #[must_use]
    pub fn with_integrator(mut self, integrator: impl Into<Integrator>) -> Self {
        self.integrator = Some(integrator.into());
        self.initialized = false;
        self
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: impl Into<Algorithm>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    #[must_use]
    pub fn with_test(mut self, test: ConvergenceTest) -> Self {
        self.test = Some(test);
        self
    }

    #[must_use]
    pub fn with_soe(mut self, soe: S) -> Self {
        self.soe = Some(soe);
        self
    }

    #[must_use]
    pub fn with_eigen_soe(mut self, eigen: E) -> Self {
        self.eigen = Some(eigen);
        self
    }

    #[must_use]
    pub fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }

    #[must_use]
    pub fn integrator(&self) -> Option<&Integrator> {
        self.integrator.as_ref()
    }

    #[must_use]
    pub fn test(&self) -> Option<&ConvergenceTest> {
        self.test.as_ref()
    }

    /// Number of steps committed so far.
    #[must_use]
    pub fn committed_steps(&self) -> usize {
        self.committed_steps
    }

    /// Consumes the analysis and returns the model, if one was set.
    #[must_use]
    pub fn into_model(self) -> Option<M> {
        self.model
    }

    /// Runs `num_steps` steps without observing iterations.
    ///
    /// # Errors
    ///
    /// See [`analyze`](Self::analyze).
    pub fn analyze_unobserved(&mut self, num_steps: usize) -> Result<Solution, Error> {
        self.analyze(num_steps, &mut ())
    }

    /// Runs `num_steps` steps.
    ///
    /// The observer receives every Newton iteration event. If it stops a
    /// step early, that step is reverted and the run ends with
    /// [`Status::StoppedByObserver`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingComponent`] or [`Error::SizeMismatch`] before
    /// any step runs, or the first step failure after reverting that step.
    pub fn analyze<Obs>(
        &mut self,
        num_steps: usize,
        observer: &mut Obs,
    ) -> Result<Solution, Error>
    where
        Obs: Observer<newton::Event, newton::Action>,
    {
        let (model, integrator, algorithm, test, soe) = match (
            self.model.as_mut(),
            self.integrator.as_mut(),
            self.algorithm.as_mut(),
            self.test.as_mut(),
            self.soe.as_mut(),
        ) {
            (Some(m), Some(i), Some(a), Some(t), Some(s)) => (m, i, a, t, s),
            (m, i, a, t, _) => {
                let missing = if m.is_none() {
                    "model"
                } else if i.is_none() {
                    "integrator"
                } else if a.is_none() {
                    "algorithm"
                } else if t.is_none() {
                    "convergence test"
                } else {
                    "system of equations"
                };
                log::error!("cannot analyze: missing {missing}");
                return Err(Error::MissingComponent(missing));
            }
        };

        check_size("system of equations", model.num_eqn(), soe.num_eqn())?;
        if let Some(eigen) = &self.eigen {
            check_size("eigen system", model.num_eqn(), eigen.num_eqn())?;
        }

        if !self.initialized {
            integrator.initialize(model);
            self.initialized = true;
        }

        let mut steps = Vec::with_capacity(num_steps);
        for _ in 0..num_steps {
            let step = self.committed_steps + 1;

            if let Err(source) = integrator.new_step(model, soe) {
                log::error!("step {step}: predictor failed: {source}");
                revert(step, model, integrator);
                return Err(Error::NewStep { step, source });
            }

            let ctx = Context {
                step,
                model: &mut *model,
                integrator: &mut *integrator,
                soe: &mut *soe,
                eigen: self.eigen.as_mut(),
                test: &mut *test,
            };

            let solution = match algorithm.solve_current_step(ctx, observer) {
                Ok(solution) => solution,
                Err(source) => {
                    log::error!("step {step} failed (code {}): {source}", source.code());
                    revert(step, model, integrator);
                    return Err(Error::Step { step, source });
                }
            };

            if solution.stopped_by_observer() {
                log::info!("step {step} stopped by observer");
                revert(step, model, integrator);
                return Ok(Solution {
                    status: Status::StoppedByObserver,
                    steps,
                    load_factor: integrator.load_factor(),
                });
            }

            integrator
                .commit(model)
                .map_err(|source| Error::Commit { step, source })?;
            self.committed_steps = step;

            log::info!("step {step} committed: λ = {}", integrator.load_factor());
            steps.push(solution);
        }

        Ok(Solution {
            status: Status::Complete,
            steps,
            load_factor: integrator.load_factor(),
        })
    }
}

fn check_size(system: &'static str, model: usize, found: usize) -> Result<(), Error> {
    if model == found {
        return Ok(());
    }
    log::error!("cannot analyze: model has {model} equations but the {system} has {found}");
    Err(Error::SizeMismatch {
        system,
        model,
        found,
    })
}

fn revert<M: StructuralModel>(step: usize, model: &mut M, integrator: &mut Integrator) {
    if let Err(e) = integrator.revert(model) {
        log::error!("step {step}: revert failed: {e}");
    }
}
