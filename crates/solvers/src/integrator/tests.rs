use approx::assert_relative_eq;
use ndarray::array;
use strut_core::{LinearSoe, StructuralModel};

use crate::{linalg::DenseSoe, test_utils::SpringModel};

use super::{
    ArcLength, CentralDifference, Error, Integrator, LoadControl, arc_length,
    central_difference, load_control,
};

fn load_control_with(increment: f64, desired: usize, min: f64, max: f64) -> Integrator {
    let config = load_control::Config::new(increment, desired, min, max).expect("valid config");
    LoadControl::new(config).into()
}

/// Runs `n` updates with a zero increment to count iterations.
fn idle_updates(
    integrator: &mut Integrator,
    model: &mut SpringModel,
    soe: &mut DenseSoe,
    n: usize,
) {
    soe.set_x(array![0.0].view());
    for _ in 0..n {
        integrator.update(model, soe).expect("initialized");
    }
}

#[test]
fn operations_before_initialize_fail() {
    let mut model = SpringModel::linear();
    let mut soe = DenseSoe::new(1);
    let mut integrator = load_control_with(0.1, 1, 0.1, 0.1);

    assert!(matches!(
        integrator.new_step(&mut model, &mut soe),
        Err(Error::NotInitialized)
    ));
    assert!(matches!(
        integrator.form_unbalance(&model, &mut soe),
        Err(Error::NotInitialized)
    ));
    assert!(matches!(
        integrator.update(&mut model, &mut soe),
        Err(Error::NotInitialized)
    ));
}

#[test]
fn system_size_must_match_model() {
    let mut model = SpringModel::linear();
    let mut soe = DenseSoe::new(3);
    let mut integrator = load_control_with(0.1, 1, 0.1, 0.1);
    integrator.initialize(&model);

    assert!(matches!(
        integrator.new_step(&mut model, &mut soe),
        Err(Error::SizeMismatch { model: 1, soe: 3 })
    ));
}

#[test]
fn load_control_scales_and_clamps_increment() {
    let mut model = SpringModel::linear();
    let mut soe = DenseSoe::new(1);
    let mut integrator = load_control_with(0.1, 2, 0.05, 0.15);
    integrator.initialize(&model);

    // First step uses the configured increment.
    integrator.new_step(&mut model, &mut soe).expect("step");
    assert_relative_eq!(integrator.load_factor(), 0.1);

    // No iterations recorded: increment unchanged.
    integrator.new_step(&mut model, &mut soe).expect("step");
    assert_relative_eq!(integrator.load_factor(), 0.2);

    // Four iterations against two desired: halved, 0.05.
    idle_updates(&mut integrator, &mut model, &mut soe, 4);
    integrator.new_step(&mut model, &mut soe).expect("step");
    assert_relative_eq!(integrator.load_factor(), 0.25);

    // Eight iterations: 0.0125 clamps to the minimum.
    idle_updates(&mut integrator, &mut model, &mut soe, 8);
    integrator.new_step(&mut model, &mut soe).expect("step");
    assert_relative_eq!(integrator.load_factor(), 0.3);

    // One iteration: doubled, 0.1.
    idle_updates(&mut integrator, &mut model, &mut soe, 1);
    integrator.new_step(&mut model, &mut soe).expect("step");
    assert_relative_eq!(integrator.load_factor(), 0.4);

    // One iteration again: 0.2 clamps to the maximum.
    idle_updates(&mut integrator, &mut model, &mut soe, 1);
    integrator.new_step(&mut model, &mut soe).expect("step");
    assert_relative_eq!(integrator.load_factor(), 0.55);
}

#[test]
fn load_control_forms_unbalance_and_updates() {
    let mut model = SpringModel::linear();
    let mut soe = DenseSoe::new(1);
    let mut integrator = load_control_with(0.5, 1, 0.5, 0.5);
    integrator.initialize(&model);

    integrator.new_step(&mut model, &mut soe).expect("step");
    integrator.form_tangent(&model, &mut soe).expect("tangent");
    integrator.form_unbalance(&model, &mut soe).expect("unbalance");
    assert_relative_eq!(soe.b()[0], 5.0);

    soe.solve().expect("solve");
    integrator.update(&mut model, &mut soe).expect("update");
    assert_relative_eq!(model.disp()[0], 0.05);

    integrator.form_unbalance(&model, &mut soe).expect("unbalance");
    assert_relative_eq!(soe.b()[0], 0.0, epsilon = 1e-12);
}

#[test]
fn revert_restores_load_factor_and_state() {
    let mut model = SpringModel::linear();
    let mut soe = DenseSoe::new(1);
    let mut integrator = load_control_with(0.1, 1, 0.1, 0.1);
    integrator.initialize(&model);

    integrator.new_step(&mut model, &mut soe).expect("step");
    integrator.commit(&mut model).expect("commit");

    integrator.new_step(&mut model, &mut soe).expect("step");
    soe.set_x(array![0.3].view());
    integrator.update(&mut model, &mut soe).expect("update");
    assert_relative_eq!(integrator.load_factor(), 0.2);

    integrator.revert(&mut model).expect("revert");
    assert_relative_eq!(integrator.load_factor(), 0.1);
    assert_relative_eq!(model.disp()[0], 0.0);
}

#[test]
fn arc_length_predictor_lies_on_the_constraint() {
    let mut model = SpringModel::softening_pair();
    let mut soe = DenseSoe::new(2);
    let config = arc_length::Config::new(0.1, 1.0).expect("valid config");
    let mut integrator = Integrator::from(ArcLength::new(config));
    integrator.initialize(&model);

    integrator.new_step(&mut model, &mut soe).expect("step");

    // K = [[2, -1], [-1, 1]] at the origin, so Ûh = [1, 2].
    let d_lambda = 0.1 / 6.0_f64.sqrt();
    assert_relative_eq!(integrator.load_factor(), d_lambda, epsilon = 1e-14);
    assert_relative_eq!(model.disp()[0], d_lambda, epsilon = 1e-14);
    assert_relative_eq!(model.disp()[1], 2.0 * d_lambda, epsilon = 1e-14);
    assert_relative_eq!(soe.x()[1], 2.0 * d_lambda, epsilon = 1e-14);

    let Integrator::ArcLength(arc) = &integrator else {
        unreachable!("constructed as arc length");
    };
    let residual = arc_length::constraint_residual(arc).expect("initialized");
    assert!(residual.abs() < 1e-15);
}

#[test]
fn arc_length_corrections_stay_on_the_constraint() {
    for constraint in [
        arc_length::Constraint::Spherical,
        arc_length::Constraint::NormalPlane,
    ] {
        let mut model = SpringModel::softening_pair();
        let mut soe = DenseSoe::new(2);
        let config = arc_length::Config::new(0.5, 1.0)
            .expect("valid config")
            .with_constraint(constraint);
        let mut integrator = Integrator::from(ArcLength::new(config));
        integrator.initialize(&model);

        integrator.new_step(&mut model, &mut soe).expect("step");
        for _ in 0..6 {
            integrator.form_tangent(&model, &mut soe).expect("tangent");
            integrator.form_unbalance(&model, &mut soe).expect("unbalance");
            soe.solve().expect("solve");
            integrator.update(&mut model, &mut soe).expect("update");
        }

        integrator.form_unbalance(&model, &mut soe).expect("unbalance");
        let unbalance = soe.b().dot(&soe.b()).sqrt();
        assert!(unbalance < 1e-8, "{constraint:?}: |R| = {unbalance}");

        if constraint == arc_length::Constraint::Spherical {
            let Integrator::ArcLength(arc) = &integrator else {
                unreachable!("constructed as arc length");
            };
            let residual = arc_length::constraint_residual(arc).expect("initialized");
            assert!(residual.abs() < 1e-12);
        }
    }
}

#[test]
fn central_difference_requires_mass() {
    let mut model = SpringModel::unit();
    let mut soe = DenseSoe::new(1);
    let config = central_difference::Config::new(0.01, 0.0).expect("valid config");
    let mut integrator = Integrator::from(CentralDifference::new(config));
    integrator.initialize(&model);

    assert!(!integrator.requires_iteration());
    assert!(!integrator.supports_line_search());

    integrator.new_step(&mut model, &mut soe).expect("step");
    assert!(matches!(
        integrator.form_tangent(&model, &mut soe),
        Err(Error::MissingMass)
    ));
}

#[test]
fn model_failures_are_boxed() {
    let mut model = SpringModel::linear();
    model.fail_tangent = true;
    let mut soe = DenseSoe::new(1);
    let mut integrator = load_control_with(0.1, 1, 0.1, 0.1);
    integrator.initialize(&model);

    let error = integrator
        .form_tangent(&model, &mut soe)
        .expect_err("tangent fails");
    assert!(matches!(error, Error::Model(_)));
    assert_eq!(
        error.to_string(),
        "model error: element state determination failed"
    );
}

#[test]
fn invalid_integrator_configs() {
    assert_eq!(
        load_control::Config::new(0.1, 1, 0.2, 0.1),
        Err(load_control::ConfigError::Bounds)
    );
    assert_eq!(
        load_control::Config::new(0.1, 0, 0.1, 0.1),
        Err(load_control::ConfigError::DesiredIters)
    );
    assert_eq!(
        arc_length::Config::new(0.0, 1.0),
        Err(arc_length::ConfigError::ArcLength)
    );
    assert_eq!(
        arc_length::Config::new(0.1, -1.0),
        Err(arc_length::ConfigError::Alpha)
    );
    assert_eq!(
        central_difference::Config::new(0.0, 0.0),
        Err(central_difference::ConfigError::TimeStep)
    );
}

#[cfg(feature = "serde-derive")]
#[test]
fn deserialized_invalid_configs_fail_the_step() {
    let mut model = SpringModel::linear();
    let mut soe = DenseSoe::new(1);

    let json = r#"{"increment":0.1,"desired_iters":1,"min_increment":0.2,"max_increment":0.1}"#;
    let config: load_control::Config = serde_json::from_str(json).expect("deserializes");
    let mut integrator = Integrator::from(LoadControl::new(config));
    integrator.initialize(&model);

    let error = integrator
        .new_step(&mut model, &mut soe)
        .expect_err("bounds are inverted");
    assert!(matches!(error, Error::InvalidConfig(_)));
    assert_eq!(
        error.to_string(),
        "invalid integrator config: increment bounds must be finite with min <= max"
    );
    assert_relative_eq!(integrator.load_factor(), 0.0);

    let json = r#"{"dt":-0.01,"load_factor":1.0}"#;
    let config: central_difference::Config = serde_json::from_str(json).expect("deserializes");
    let mut integrator = Integrator::from(CentralDifference::new(config));
    integrator.initialize(&model);

    assert!(matches!(
        integrator.new_step(&mut model, &mut soe),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn display_summarizes_load_control() {
    let mut model = SpringModel::linear();
    let mut soe = DenseSoe::new(1);
    let mut integrator = load_control_with(0.1, 1, 0.1, 0.1);
    integrator.initialize(&model);
    integrator.new_step(&mut model, &mut soe).expect("initialized");

    assert_eq!(
        integrator.to_string(),
        "LoadControl: λ = 0.1, Δλ = 0.1 (Jd = 1, bounds [0.1, 0.1])"
    );
}
