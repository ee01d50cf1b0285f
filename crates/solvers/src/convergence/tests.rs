use approx::assert_relative_eq;
use ndarray::{Array1, array};

use super::{Config, ConfigError, ConvergenceTest, Error, Kind, Norm, Verbosity, Verdict};

fn test_with(kind: Kind, tolerance: f64, max_iters: usize) -> ConvergenceTest {
    ConvergenceTest::new(Config::new(kind, tolerance, max_iters).expect("valid config"))
}

#[test]
fn test_before_start_fails() {
    let mut test = test_with(Kind::NormUnbalance, 1e-6, 10);
    let v = array![1.0];

    assert_eq!(test.test(v.view(), v.view()), Err(Error::NotStarted));
    assert_eq!(test.advance(), Err(Error::NotStarted));
    assert_eq!(test.iter(), None);
}

#[test]
fn testing_twice_gives_the_same_verdict() {
    let mut test = test_with(Kind::NormDispIncr, 1e-6, 5);
    test.start();

    let x = array![0.1, 0.2];
    let b = array![0.0, 0.0];
    let first = test.test(x.view(), b.view()).expect("started");
    let second = test.test(x.view(), b.view()).expect("started");

    assert_eq!(first, Verdict::Continue);
    assert_eq!(first, second);
    assert_eq!(test.iter(), Some(1));
    assert_eq!(test.history().len(), 1);
}

#[test]
fn fails_exactly_at_max_iters() {
    let mut test = test_with(Kind::NormUnbalance, 1e-6, 3);
    test.start();

    let x = array![0.0];
    let b = array![1.0];
    let mut verdicts = Vec::new();
    let mut iters = Vec::new();
    loop {
        iters.push(test.iter().expect("started"));
        let verdict = test.test(x.view(), b.view()).expect("started");
        verdicts.push(verdict);
        if !verdict.is_continue() {
            break;
        }
        test.advance().expect("started");
    }

    assert_eq!(iters, vec![1, 2, 3]);
    assert_eq!(
        verdicts,
        vec![Verdict::Continue, Verdict::Continue, Verdict::Failed(3)]
    );
    assert_eq!(test.history(), &[1.0, 1.0, 1.0]);

    // Saturates instead of growing the history.
    test.advance().expect("started");
    assert_eq!(test.iter(), Some(3));
}

#[test]
fn converged_reports_iteration() {
    let mut test = test_with(Kind::NormUnbalance, 1e-3, 10);
    test.start();
    let x = array![0.0];

    assert_eq!(test.test(x.view(), array![1.0].view()), Ok(Verdict::Continue));
    test.advance().expect("started");
    assert_eq!(
        test.test(x.view(), array![1e-4].view()),
        Ok(Verdict::Converged(2))
    );
}

#[test]
fn start_resets_history() {
    let mut test = test_with(Kind::NormUnbalance, 1e-3, 10);
    test.start();
    test.test(array![0.0].view(), array![1.0].view())
        .expect("started");
    test.advance().expect("started");

    test.start();
    assert_eq!(test.iter(), Some(1));
    assert!(test.history().is_empty());
    assert_eq!(test.last_norm(), None);
}

#[test]
fn energy_increment_is_half_abs_work() {
    let mut test = test_with(Kind::EnergyIncr, 1e-12, 10);
    test.start();

    test.test(array![1.0, 2.0].view(), array![-3.0, 0.5].view())
        .expect("started");

    assert_relative_eq!(test.last_norm().expect("tested"), 1.0);
}

#[test]
fn relative_unbalance_uses_first_iteration() {
    let mut test = test_with(Kind::RelativeNormUnbalance, 1e-2, 10);
    test.start();
    let x = array![0.0];

    assert_eq!(test.test(x.view(), array![4.0].view()), Ok(Verdict::Continue));
    assert_relative_eq!(test.last_norm().expect("tested"), 1.0);

    test.advance().expect("started");
    assert_eq!(
        test.test(x.view(), array![0.02].view()),
        Ok(Verdict::Converged(2))
    );
    assert_relative_eq!(test.last_norm().expect("tested"), 0.005);
}

#[test]
fn relative_displacement_uses_first_increment() {
    let mut test = test_with(Kind::RelativeNormDispIncr, 1e-2, 10);
    test.start();
    let b = array![0.0, 0.0];

    assert_eq!(test.test(array![3.0, 4.0].view(), b.view()), Ok(Verdict::Continue));
    assert_relative_eq!(test.last_norm().expect("tested"), 1.0);

    test.advance().expect("started");
    assert_eq!(
        test.test(array![0.003, 0.004].view(), b.view()),
        Ok(Verdict::Converged(2))
    );
    assert_relative_eq!(test.last_norm().expect("tested"), 1e-3, epsilon = 1e-15);
}

#[test]
fn relative_energy_uses_first_iteration_work() {
    let mut test = test_with(Kind::RelativeEnergyIncr, 0.1, 10);
    test.start();

    assert_eq!(
        test.test(array![2.0].view(), array![4.0].view()),
        Ok(Verdict::Continue)
    );
    assert_relative_eq!(test.last_norm().expect("tested"), 1.0);

    test.advance().expect("started");
    assert_eq!(
        test.test(array![0.5].view(), array![-0.4].view()),
        Ok(Verdict::Converged(2))
    );
    assert_relative_eq!(test.last_norm().expect("tested"), 0.025, epsilon = 1e-15);
}

#[test]
fn relative_total_divides_by_step_sum() {
    let mut test = test_with(Kind::RelativeTotalNormDispIncr, 1e-1, 10);
    test.start();
    let b = array![0.0];

    test.test(array![1.0].view(), b.view()).expect("started");
    assert_relative_eq!(test.last_norm().expect("tested"), 1.0);

    test.advance().expect("started");
    test.test(array![0.5].view(), b.view()).expect("started");
    assert_relative_eq!(test.last_norm().expect("tested"), 0.5 / 1.5);

    // Re-testing the same iteration with a different increment replaces it.
    test.test(array![0.05].view(), b.view()).expect("started");
    assert_relative_eq!(test.last_norm().expect("tested"), 0.05 / 1.05);
}

#[test]
fn combined_kinds() {
    let x = array![1e-8];
    let b = array![1.0];

    let mut and = test_with(Kind::NormDispAndUnbalance { unbalance_tol: 1e-3 }, 1e-6, 4);
    and.start();
    assert_eq!(and.test(x.view(), b.view()), Ok(Verdict::Continue));
    assert_eq!(and.unbalance_history(), &[1.0]);

    let mut or = test_with(Kind::NormDispOrUnbalance { unbalance_tol: 1e-3 }, 1e-6, 4);
    or.start();
    assert_eq!(or.test(x.view(), b.view()), Ok(Verdict::Converged(1)));
}

#[test]
fn fixed_number_of_iterations() {
    let mut test = test_with(Kind::FixedNumIter, 0.0, 2);
    test.start();
    let zero = Array1::zeros(1);

    assert_eq!(test.test(zero.view(), zero.view()), Ok(Verdict::Continue));
    test.advance().expect("started");
    assert_eq!(test.test(zero.view(), zero.view()), Ok(Verdict::Converged(2)));
}

#[test]
fn verbosity_does_not_change_verdicts() {
    let x = array![0.3, -0.4];
    let b = array![2.0, 0.0];

    let verdicts: Vec<_> = [
        Verbosity::Silent,
        Verbosity::EachIteration,
        Verbosity::OnSuccess,
        Verbosity::Detailed,
    ]
    .into_iter()
    .map(|verbosity| {
        let config = Config::new(Kind::NormDispIncr, 0.6, 3)
            .expect("valid config")
            .with_verbosity(verbosity);
        let mut test = ConvergenceTest::new(config);
        test.start();
        test.test(x.view(), b.view())
    })
    .collect();

    assert!(verdicts.iter().all(|v| *v == Ok(Verdict::Converged(1))));
}

#[test]
fn max_norm() {
    let config = Config::new(Kind::NormUnbalance, 1.5, 3)
        .and_then(|c| c.with_norm(Norm::Max))
        .expect("valid config");
    let mut test = ConvergenceTest::new(config);
    test.start();

    assert_eq!(
        test.test(array![0.0, 0.0].view(), array![1.0, -1.0].view()),
        Ok(Verdict::Converged(1))
    );
}

#[test]
fn size_mismatch_is_an_error() {
    let mut test = test_with(Kind::NormUnbalance, 1e-6, 3);
    test.start();

    assert_eq!(
        test.test(array![0.0].view(), array![1.0, 2.0].view()),
        Err(Error::SizeMismatch { x: 1, b: 2 })
    );
}

#[test]
fn invalid_configs() {
    assert_eq!(
        Config::new(Kind::NormUnbalance, -1.0, 3),
        Err(ConfigError::Tolerance)
    );
    assert_eq!(
        Config::new(Kind::NormUnbalance, f64::NAN, 3),
        Err(ConfigError::Tolerance)
    );
    assert_eq!(
        Config::new(Kind::NormUnbalance, 1e-6, 0),
        Err(ConfigError::MaxIters)
    );
    assert_eq!(
        Config::new(
            Kind::NormDispOrUnbalance {
                unbalance_tol: f64::NAN
            },
            1e-6,
            3
        ),
        Err(ConfigError::UnbalanceTolerance)
    );
    assert_eq!(
        Config::default().with_norm(Norm::P(0.5)),
        Err(ConfigError::NormOrder)
    );
}

#[cfg(feature = "serde-derive")]
#[test]
fn config_round_trips_through_json() {
    let config = Config::new(Kind::NormDispOrUnbalance { unbalance_tol: 1e-4 }, 1e-8, 12)
        .and_then(|c| c.with_norm(Norm::Max))
        .expect("valid config")
        .with_verbosity(Verbosity::OnSuccess);

    let json = serde_json::to_string(&config).expect("serializes");
    let back: Config = serde_json::from_str(&json).expect("deserializes");

    assert_eq!(back, config);
    assert_eq!(back.validate(), Ok(()));
}

#[cfg(feature = "serde-derive")]
#[test]
fn deserialized_invalid_config_fails_the_test() {
    let config = Config::new(Kind::NormUnbalance, 1e-6, 3).expect("valid config");
    let mut json = serde_json::to_value(config).expect("serializes");
    json["tolerance"] = serde_json::json!(-1.0);
    json["max_iters"] = serde_json::json!(0);
    let config: Config = serde_json::from_value(json).expect("deserializes");

    let mut test = ConvergenceTest::new(config);
    test.start();
    let v = array![1.0];

    assert_eq!(
        test.test(v.view(), v.view()),
        Err(Error::Config(ConfigError::Tolerance))
    );
    assert!(test.history().is_empty());
}

#[test]
fn display_includes_latest_metric() {
    let mut test = test_with(Kind::NormUnbalance, 1e-6, 10);
    assert_eq!(
        test.to_string(),
        "NormUnbalance: tol = 1e-6, max iters = 10, norm = P(2.0)"
    );

    test.start();
    let x = array![0.0];
    let b = array![0.5];
    test.test(x.view(), b.view()).expect("started");
    assert!(test.to_string().ends_with(", iter 1: 5e-1"));
}
