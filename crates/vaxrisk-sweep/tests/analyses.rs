use vaxrisk_immune::{CohortConfig, SUMMARY_COLUMNS};
use vaxrisk_sweep::{
    methods_comparison, month_starts, simulation_examples, vaccination_example, within_host_example,
    MethodsComparisonConfig, SimulationExamplesConfig, BRANCHING_COLUMNS,
    VACCINATION_EXAMPLE_COLUMNS,
};
use vaxrisk_transmission::{
    vaccinated_profile, BranchingConfig, Dispersion, GenerationTimeConfig, ModelConfig,
    OutbreakRiskModel, SeasonalReproduction, SimulationConfig,
};

fn small_config() -> ModelConfig {
    ModelConfig {
        period: 30,
        generation_time: GenerationTimeConfig::Pmf {
            pmf: vec![0.2, 0.5, 0.3],
        },
        cohort: CohortConfig {
            population_size: 8,
            ..CohortConfig::default()
        },
        ..ModelConfig::default()
    }
}

#[test]
fn vaccination_example_pairs_each_risk_with_its_unvaccinated_counterpart() {
    let config = small_config();
    let profile = vaccinated_profile(&config).unwrap();
    let table = vaccination_example(&config, &profile).unwrap();
    assert_eq!(table.columns(), VACCINATION_EXAMPLE_COLUMNS);
    assert_eq!(table.len(), 60);

    let unvaccinated = OutbreakRiskModel::new(&ModelConfig {
        immunity: None,
        ..config.clone()
    })
    .unwrap();
    let times = table.column("time").unwrap();
    assert_eq!(
        table.column("case_outbreak_risk_unvaccinated").unwrap(),
        unvaccinated.case_outbreak_risk(&times).unwrap()
    );
    assert_eq!(
        table.column("outbreak_risk_unvaccinated").unwrap(),
        unvaccinated.instantaneous_outbreak_risk(&times).unwrap()
    );

    let vaccinated = table.column("reproduction_number").unwrap();
    let baseline = table.column("unvaccinated_reproduction_number").unwrap();
    assert!(vaccinated.iter().zip(&baseline).all(|(v, b)| v <= b));
    // Two periods of a periodic model repeat.
    let risk = table.column("case_outbreak_risk").unwrap();
    assert_eq!(risk[..30], risk[30..]);
}

#[test]
fn within_host_example_needs_immunity() {
    let config = small_config();
    let table = within_host_example(&config).unwrap();
    assert_eq!(table.columns(), SUMMARY_COLUMNS);
    assert_eq!(table.len(), 30);

    let unvaccinated = ModelConfig {
        immunity: None,
        ..config
    };
    let err = within_host_example(&unvaccinated).unwrap_err();
    assert_eq!(err.info().code, "immunity-missing");
}

#[test]
fn month_starts_follow_the_calendar_for_a_year() {
    let year = month_starts(365, 2);
    assert_eq!(year.len(), 24);
    assert_eq!(
        year[..12],
        [0.0, 31.0, 59.0, 90.0, 120.0, 151.0, 181.0, 212.0, 243.0, 273.0, 304.0, 334.0]
    );
    assert_eq!(year[12], 365.0);

    let short = month_starts(60, 1);
    assert_eq!(short, (0..12).map(|month| month as f64 * 5.0).collect::<Vec<_>>());
}

#[test]
fn methods_comparison_tables_line_up() {
    let config = small_config();
    let comparison = MethodsComparisonConfig {
        dispersions: vec![Dispersion::negative_binomial(1.0), Dispersion::Poisson],
        simulation: SimulationConfig {
            simulations: 50,
            max_days: 200,
            ..SimulationConfig::default()
        },
        branching_reproduction_numbers: vec![2.0],
        branching: BranchingConfig {
            trials: 200,
            ..BranchingConfig::default()
        },
        ..MethodsComparisonConfig::default()
    };
    let tables = methods_comparison(&config, &comparison).unwrap();

    assert_eq!(tables.reproduction.columns(), ["time", "reproduction_number"]);
    assert_eq!(tables.reproduction.len(), 60);
    let reproduction = tables.reproduction.column("reproduction_number").unwrap();
    assert!((reproduction[0] - 3.0).abs() < 1e-12);

    assert_eq!(tables.analytic.columns(), ["time", "1", "poisson"]);
    assert_eq!(tables.analytic.len(), 60);
    assert_eq!(
        tables.simulated.columns(),
        ["time", "1", "1_standard_error", "poisson", "poisson_standard_error"]
    );
    assert_eq!(tables.simulated.len(), 24);
    for name in ["1", "poisson"] {
        assert!(tables
            .simulated
            .column(name)
            .unwrap()
            .iter()
            .all(|fraction| (0.0..=1.0).contains(fraction)));
    }

    assert_eq!(tables.branching.columns(), BRANCHING_COLUMNS);
    assert_eq!(tables.branching.len(), 2);
    let analytic = tables.branching.column("analytic").unwrap();
    assert!((analytic[0] - 0.5).abs() < 1e-6);
    assert_eq!(tables.branching.column("dispersion").unwrap()[1], f64::INFINITY);

    let empty = MethodsComparisonConfig {
        dispersions: vec![],
        ..comparison
    };
    assert!(methods_comparison(&config, &empty).unwrap_err().is_config());
}

#[test]
fn simulation_examples_pad_extinct_runs_with_zeros() {
    let examples = SimulationExamplesConfig {
        reproduction: SeasonalReproduction {
            mean: 0.0,
            ..SeasonalReproduction::default()
        },
        runs: 3,
        days: 10,
        ..SimulationExamplesConfig::default()
    };
    let table = simulation_examples(&small_config(), &examples).unwrap();
    assert_eq!(
        table.columns(),
        ["time", "simulation_0", "simulation_1", "simulation_2"]
    );
    let mut expected = vec![0.0; 10];
    expected[0] = 1.0;
    for run in 0..3 {
        assert_eq!(table.column(&format!("simulation_{run}")).unwrap(), expected);
    }
}

#[test]
fn simulation_examples_are_reproducible() {
    let config = small_config();
    let examples = SimulationExamplesConfig {
        runs: 20,
        ..SimulationExamplesConfig::default()
    };
    let first = simulation_examples(&config, &examples).unwrap();
    let second = simulation_examples(&config, &examples).unwrap();
    assert_eq!(first.len(), 50);
    assert_eq!(first.columns().len(), 21);
    let bits = |table: &vaxrisk_core::ResultTable| -> Vec<u64> {
        table
            .rows()
            .iter()
            .flatten()
            .map(|value| value.to_bits())
            .collect()
    };
    assert_eq!(bits(&first), bits(&second));
    for name in &first.columns()[1..] {
        let incidence = first.column(name).unwrap();
        assert_eq!(incidence[0], 1.0);
        assert!(incidence
            .iter()
            .all(|cases| cases.is_nan() || (cases.fract() == 0.0 && *cases >= 0.0)));
    }
}
