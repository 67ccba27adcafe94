use proptest::prelude::*;
use vaxrisk_transmission::{
    instantaneous_outbreak_risk, instantaneous_outbreak_risks, Dispersion, SolverConfig,
};

fn ior(r: f64, k: f64) -> f64 {
    instantaneous_outbreak_risk(r, &Dispersion::negative_binomial(k), &SolverConfig::default())
        .unwrap()
}

#[test]
fn subcritical_and_critical_risk_is_exactly_zero() {
    for r in [0.0, 0.3, 0.99, 1.0] {
        assert_eq!(ior(r, 0.41), 0.0);
        let poisson =
            instantaneous_outbreak_risk(r, &Dispersion::Poisson, &SolverConfig::default()).unwrap();
        assert_eq!(poisson, 0.0);
    }
}

#[test]
fn geometric_offspring_has_closed_form() {
    for r in [1.2, 2.0, 3.5, 8.0] {
        assert!((ior(r, 1.0) - (1.0 - 1.0 / r)).abs() < 1e-8, "r = {r}");
    }
}

#[test]
fn large_k_converges_to_poisson_branch() {
    let solver = SolverConfig::default();
    for r in [1.1, 1.5, 2.0, 3.0, 5.0] {
        let poisson = instantaneous_outbreak_risk(r, &Dispersion::Poisson, &solver).unwrap();
        // The Poisson risk solves q = 1 - exp(-r q).
        assert!((poisson - (1.0 - (-r * poisson).exp())).abs() < 1e-9);
        assert!((ior(r, 1e6) - poisson).abs() < 1e-4, "r = {r}");
    }
}

#[test]
fn overdispersion_lowers_risk() {
    let r = 2.5;
    let scenario = ior(r, 0.3);
    assert!(scenario > 0.3 && scenario < 0.36, "risk {scenario}");
    assert!(ior(r, 1.0) > 0.5);
    assert!(ior(r, 0.1) < scenario);
}

#[test]
fn exhausted_bisection_reports_convergence_error() {
    let solver = SolverConfig {
        max_bisection_iterations: 3,
        ..SolverConfig::default()
    };
    let err = instantaneous_outbreak_risk(2.0, &Dispersion::negative_binomial(0.5), &solver)
        .unwrap_err();
    assert!(matches!(err, vaxrisk_core::VaxError::Convergence(_)));
}

#[test]
fn vectorised_solver_preserves_order() {
    let risks = instantaneous_outbreak_risks(
        &[0.5, 2.0, 3.0],
        &Dispersion::negative_binomial(0.41),
        &SolverConfig::default(),
    )
    .unwrap();
    assert_eq!(risks[0], 0.0);
    assert!(risks[1] < risks[2]);
}

proptest! {
    #[test]
    fn risk_is_strictly_increasing_above_one(r in 1.01f64..20.0, step in 0.01f64..2.0, k in 0.05f64..50.0) {
        let low = ior(r, k);
        let high = ior(r + step, k);
        prop_assert!(low > 0.0);
        prop_assert!(high > low);
        prop_assert!(high <= 1.0);
    }
}
