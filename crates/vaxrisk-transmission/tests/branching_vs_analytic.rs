use vaxrisk_transmission::{
    branching_outbreak_risk, instantaneous_outbreak_risk, BranchingConfig, Dispersion,
    IndividualReproduction, Introduction, MonteCarloEstimate, SolverConfig, TrialStatus,
};

#[test]
fn monte_carlo_agrees_with_extinction_equation() {
    let dispersion = Dispersion::negative_binomial(0.5);
    let config = BranchingConfig {
        trials: 20_000,
        ..BranchingConfig::default()
    };
    let estimate = branching_outbreak_risk(2.0, &dispersion, &config).unwrap();
    let analytic = instantaneous_outbreak_risk(2.0, &dispersion, &SolverConfig::default()).unwrap();
    assert_eq!(estimate.trials, 20_000);
    assert_eq!(estimate.unresolved, 0);
    assert!(
        (estimate.fraction - analytic).abs() <= 3.0 * estimate.standard_error,
        "estimate {} ± {}, analytic {analytic}",
        estimate.fraction,
        estimate.standard_error
    );
}

#[test]
fn identical_seeds_give_identical_estimates() {
    let dispersion = Dispersion::negative_binomial(0.41);
    let config = BranchingConfig {
        trials: 2_000,
        seed: 11,
        ..BranchingConfig::default()
    };
    let first = branching_outbreak_risk(1.8, &dispersion, &config).unwrap();
    let second = branching_outbreak_risk(1.8, &dispersion, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn no_transmission_never_takes_off() {
    let config = BranchingConfig {
        trials: 500,
        ..BranchingConfig::default()
    };
    let estimate = branching_outbreak_risk(0.0, &Dispersion::Poisson, &config).unwrap();
    assert_eq!(estimate.outbreaks, 0);
    assert_eq!(estimate.fraction, 0.0);
}

#[test]
fn generation_cap_counts_unresolved_as_outbreaks() {
    let config = BranchingConfig {
        trials: 200,
        outbreak_threshold: u64::MAX,
        max_generations: 1,
        initial_cases: 5,
        ..BranchingConfig::default()
    };
    let estimate = branching_outbreak_risk(3.0, &Dispersion::Poisson, &config).unwrap();
    assert!(estimate.unresolved > 0);
    assert_eq!(estimate.outbreaks, estimate.unresolved);
}

#[test]
fn invalid_settings_are_config_errors() {
    let config = BranchingConfig {
        trials: 0,
        ..BranchingConfig::default()
    };
    let err = branching_outbreak_risk(2.0, &Dispersion::Poisson, &config).unwrap_err();
    assert!(err.is_config());
    assert_eq!(err.info().context.get("parameter").map(String::as_str), Some("trials"));

    let err = branching_outbreak_risk(-1.0, &Dispersion::Poisson, &BranchingConfig::default())
        .unwrap_err();
    assert!(err.is_config());
}

#[test]
fn estimate_summary_matches_counts() {
    let statuses = [
        TrialStatus::Outbreak,
        TrialStatus::Extinct,
        TrialStatus::Unresolved,
        TrialStatus::Extinct,
    ];
    let estimate = MonteCarloEstimate::from_statuses(&statuses);
    assert_eq!(estimate.outbreaks, 2);
    assert_eq!(estimate.unresolved, 1);
    assert_eq!(estimate.fraction, 0.5);
    assert!((estimate.standard_error - (0.25_f64 / 4.0).sqrt()).abs() < 1e-15);
}

#[test]
fn gamma_mixing_sets_negative_binomial_dispersion() {
    let individual = IndividualReproduction::from_mean_variance(2.0, 8.0).unwrap();
    assert_eq!(individual.dispersion, 0.5);
    assert_eq!(individual.variance(), 8.0);
    assert_eq!(individual.offspring_variance(), 10.0);

    let solver = SolverConfig::default();
    let mixed = instantaneous_outbreak_risk(
        individual.mean,
        &Dispersion::negative_binomial(individual.dispersion),
        &solver,
    )
    .unwrap();
    let direct = instantaneous_outbreak_risk(2.0, &Dispersion::negative_binomial(0.5), &solver).unwrap();
    assert_eq!(mixed, direct);

    assert!(IndividualReproduction::from_mean_variance(2.0, 0.0).is_err());
}

#[test]
fn several_or_random_introductions_match_the_combined_risk() {
    let dispersion = Dispersion::negative_binomial(1.0);
    let single = instantaneous_outbreak_risk(2.0, &dispersion, &SolverConfig::default()).unwrap();
    let introductions = [
        BranchingConfig {
            trials: 20_000,
            initial_cases: 3,
            ..BranchingConfig::default()
        },
        BranchingConfig {
            trials: 20_000,
            introduction: Introduction::Poisson { mean: 2.0 },
            ..BranchingConfig::default()
        },
    ];
    let expected = [1.0 - 0.5_f64.powi(3), 1.0 - (-1.0_f64).exp()];
    for (config, expected) in introductions.iter().zip(expected) {
        let analytic = config.introduction_risk(single);
        assert!((analytic - expected).abs() < 1e-9);
        let estimate = branching_outbreak_risk(2.0, &dispersion, config).unwrap();
        assert!(
            (estimate.fraction - analytic).abs() <= 3.0 * estimate.standard_error + 1e-3,
            "estimate {} ± {}, analytic {analytic}",
            estimate.fraction,
            estimate.standard_error
        );
    }

    let invalid = BranchingConfig {
        introduction: Introduction::Poisson { mean: 0.0 },
        ..BranchingConfig::default()
    };
    assert!(invalid.validate().unwrap_err().is_config());
}
