use vaxrisk_immune::CohortConfig;
use vaxrisk_opt::{
    optimize_timing, BoostScheduleProblem, CampaignTimingProblem, OptimizerConfig, Refinement,
    TimingProblem, CAMPAIGN_AXES, OBJECTIVE_COLUMN,
};
use vaxrisk_transmission::{vaccinated_profile, GenerationTimeConfig, ModelConfig, OutbreakRiskModel};

fn short_period_config(period: usize) -> ModelConfig {
    ModelConfig {
        period,
        generation_time: GenerationTimeConfig::Pmf {
            pmf: vec![0.2, 0.5, 0.3],
        },
        cohort: CohortConfig {
            population_size: 16,
            ..CohortConfig::default()
        },
        ..ModelConfig::default()
    }
}

#[test]
fn campaign_optimum_is_reported_with_grid_and_trajectory() {
    let config = short_period_config(60);
    let profile = vaccinated_profile(&config).unwrap();
    let problem = CampaignTimingProblem::new(&config, &profile).unwrap();
    let optimizer = OptimizerConfig::default();
    let result = optimize_timing(&problem, &optimizer).unwrap();

    assert_eq!(result.grid.axes, CAMPAIGN_AXES);
    assert_eq!(result.grid.evaluations.len(), 7 * 6);
    assert!(result
        .grid
        .evaluations
        .iter()
        .all(|evaluation| evaluation.objective_value >= result.grid_best.objective_value));
    assert!(result.best.objective_value <= result.grid_best.objective_value);
    assert!(result.best.point[1] >= 1.0);

    let recomputed = problem.objective(&result.best.point).unwrap();
    assert_eq!(recomputed, result.best.objective_value);
    assert_eq!(result.best_trajectory.time.len(), 60);
    assert_eq!(result.provenance.config_hash, config.config_hash().unwrap());

    let grid_table = result.grid_table().unwrap();
    assert_eq!(
        grid_table.columns(),
        [CAMPAIGN_AXES[0], CAMPAIGN_AXES[1], OBJECTIVE_COLUMN]
    );
    assert_eq!(result.best_table().unwrap().len(), 1);

    let unvaccinated = ModelConfig {
        immunity: None,
        ..config.clone()
    };
    let baseline = OutbreakRiskModel::new(&unvaccinated)
        .unwrap()
        .objective_value(&config.objective)
        .unwrap();
    assert!(result.best.objective_value < baseline);
}

#[test]
fn repeated_optimisation_is_bit_identical() {
    let config = short_period_config(40);
    let profile = vaccinated_profile(&config).unwrap();
    let problem = CampaignTimingProblem::new(&config, &profile).unwrap();
    let optimizer = OptimizerConfig {
        grid_step: 10.0,
        refinement: Refinement::PatternSearch {
            min_step: 0.5,
            max_evaluations: 100,
        },
    };
    let first = optimize_timing(&problem, &optimizer).unwrap();
    let second = optimize_timing(&problem, &optimizer).unwrap();
    assert_eq!(first, second);
}

#[test]
fn boost_schedule_marks_unordered_doses_infeasible() {
    let config = short_period_config(30);
    let problem = BoostScheduleProblem::new(&config, 2).unwrap();
    assert_eq!(problem.axis_names(), ["vaccination_time", "vaccination_time_2"]);
    assert_eq!(problem.objective(&[20.0, 10.0]).unwrap(), f64::INFINITY);
    assert_eq!(problem.objective(&[10.0, 10.0]).unwrap(), f64::INFINITY);

    let optimizer = OptimizerConfig {
        grid_step: 10.0,
        refinement: Refinement::None,
    };
    let result = optimize_timing(&problem, &optimizer).unwrap();
    assert_eq!(result.grid.evaluations.len(), 9);
    let best = &result.best.point;
    assert!(best[0] < best[1]);
    assert!(result.best.objective_value.is_finite());
}

#[test]
fn invalid_problems_fail_fast() {
    let config = short_period_config(30);
    assert!(BoostScheduleProblem::new(&config, 0).unwrap_err().is_config());

    let unvaccinated = ModelConfig {
        immunity: None,
        ..config.clone()
    };
    assert!(BoostScheduleProblem::new(&unvaccinated, 1).is_err());

    let profile = vaccinated_profile(&config).unwrap();
    let problem = CampaignTimingProblem::new(&config, &profile).unwrap();
    let optimizer = OptimizerConfig {
        grid_step: 0.0,
        ..OptimizerConfig::default()
    };
    assert!(optimize_timing(&problem, &optimizer).unwrap_err().is_config());
}

#[test]
fn grid_point_models_match_the_validating_constructors() {
    let config = short_period_config(30);
    let profile = vaccinated_profile(&config).unwrap();

    let campaign = CampaignTimingProblem::new(&config, &profile).unwrap();
    let point = [5.0, 12.0];
    let from_problem = campaign.model(&point).unwrap().unwrap();
    let direct = OutbreakRiskModel::with_campaign(&config, &profile, &campaign.campaign(&point)).unwrap();
    assert_eq!(
        from_problem.daily_case_outbreak_risk().unwrap(),
        direct.daily_case_outbreak_risk().unwrap()
    );

    let boost = BoostScheduleProblem::new(&config, 1).unwrap();
    let susceptibility = boost.susceptibility(&[7.0]).unwrap().unwrap();
    let from_problem = boost.model(&[7.0]).unwrap().unwrap();
    let direct = OutbreakRiskModel::from_susceptibility(&config, susceptibility).unwrap();
    assert_eq!(
        from_problem.daily_susceptibility(),
        direct.daily_susceptibility()
    );
    assert_eq!(
        from_problem.daily_case_outbreak_risk().unwrap(),
        direct.daily_case_outbreak_risk().unwrap()
    );
}
