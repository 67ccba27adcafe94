use vaxrisk_core::VaxError;
use vaxrisk_immune::VaccinationCampaign;
use vaxrisk_transmission::{
    december_january, DayWindow, Dispersion, GenerationTimeConfig, ModelConfig, ObjectiveConfig,
    ObjectiveFunction, OutbreakRiskModel, RiskMeasure, SeasonalReproduction, TRAJECTORY_COLUMNS,
};

fn unvaccinated_config() -> ModelConfig {
    ModelConfig {
        immunity: None,
        ..ModelConfig::default()
    }
}

#[test]
fn yaml_overrides_merge_with_defaults() {
    let yaml = r#"
period: 120
reproduction:
  mean: 2.0
  proportional_variation: 0.5
dispersion:
  type: poisson
generation_time:
  type: pmf
  pmf: [0.25, 0.5, 0.25]
immunity: null
campaign:
  start: 10
  end: 40
  coverage: 0.5
"#;
    let config = ModelConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.period, 120);
    assert_eq!(config.dispersion, Dispersion::Poisson);
    assert!(config.immunity.is_none());
    assert_eq!(config.reproduction.peak_time, 0.0);
    assert_eq!(config.solver, Default::default());
    assert_eq!(config.objective.function, ObjectiveFunction::Peak);
}

#[test]
fn invalid_values_fail_before_any_computation() {
    let cases = [
        ModelConfig {
            period: 0,
            ..unvaccinated_config()
        },
        ModelConfig {
            dispersion: Dispersion::negative_binomial(-0.5),
            ..unvaccinated_config()
        },
        ModelConfig {
            period: 10,
            ..unvaccinated_config()
        },
        ModelConfig {
            campaign: VaccinationCampaign {
                coverage: 1.5,
                ..VaccinationCampaign::default()
            },
            ..unvaccinated_config()
        },
        ModelConfig {
            reproduction: SeasonalReproduction {
                proportional_variation: 1.5,
                ..SeasonalReproduction::default()
            },
            ..unvaccinated_config()
        },
    ];
    for config in cases {
        let err = OutbreakRiskModel::new(&config).unwrap_err();
        assert!(matches!(err, VaxError::Config(_)), "{err}");
    }
}

#[test]
fn hashes_are_stable_and_profile_hash_ignores_transmission() {
    let config = ModelConfig::default();
    assert_eq!(config.config_hash().unwrap(), config.clone().config_hash().unwrap());
    let changed = ModelConfig {
        dispersion: Dispersion::Poisson,
        ..ModelConfig::default()
    };
    assert_ne!(config.config_hash().unwrap(), changed.config_hash().unwrap());
    assert_eq!(config.profile_hash().unwrap(), changed.profile_hash().unwrap());
}

#[test]
fn unvaccinated_trajectory_follows_seasonal_reproduction() {
    let model = OutbreakRiskModel::new(&unvaccinated_config()).unwrap();
    let times = [0.0, 91.25, 182.5, 400.0];
    let trajectory = model.trajectory(&times).unwrap();
    assert_eq!(trajectory.susceptibility, vec![1.0; 4]);
    assert_eq!(
        trajectory.reproduction_number,
        trajectory.unvaccinated_reproduction_number
    );
    assert!((trajectory.reproduction_number[0] - 3.0).abs() < 1e-9);
    assert!((trajectory.reproduction_number[2] - 2.0).abs() < 1e-2);
    assert!(trajectory.outbreak_risk[0] > trajectory.outbreak_risk[2]);
    assert!(trajectory.peak_case_outbreak_risk() > 0.0);

    let table = trajectory.to_table().unwrap();
    assert_eq!(table.columns(), TRAJECTORY_COLUMNS);
    assert_eq!(table.len(), 4);
}

#[test]
fn fully_protected_population_has_zero_risk() {
    let config = unvaccinated_config();
    let model = OutbreakRiskModel::from_susceptibility(&config, vec![0.0; config.period]).unwrap();
    let risk = model.daily_case_outbreak_risk().unwrap();
    assert!(risk.iter().all(|&value| value == 0.0));
    let instantaneous = model.daily_risk(RiskMeasure::Instantaneous).unwrap();
    assert!(instantaneous.iter().all(|&value| value == 0.0));
}

#[test]
fn susceptibility_length_must_match_period() {
    let config = unvaccinated_config();
    let err = OutbreakRiskModel::from_susceptibility(&config, vec![1.0; 10]).unwrap_err();
    assert_eq!(err.info().code, "susceptibility-length");
}

#[test]
fn objectives_order_as_expected() {
    let model = OutbreakRiskModel::new(&unvaccinated_config()).unwrap();
    let value = |function: ObjectiveFunction| {
        model
            .objective_value(&ObjectiveConfig {
                function,
                measure: RiskMeasure::Case,
            })
            .unwrap()
    };
    let peak = value(ObjectiveFunction::Peak);
    let mean = value(ObjectiveFunction::Mean);
    let winter = value(ObjectiveFunction::WindowMean {
        windows: december_january(365),
    });
    let weighted = value(ObjectiveFunction::SeasonalWeightedMean);
    assert!(peak > winter && winter > mean);
    assert!(weighted > mean);
    assert!((value(ObjectiveFunction::PeakPlusMean { mean_weight: 1.0 }) - (peak + mean)).abs() < 1e-12);

    let err = model
        .objective_value(&ObjectiveConfig {
            function: ObjectiveFunction::WindowMean {
                windows: vec![DayWindow { start: 300, end: 400 }],
            },
            measure: RiskMeasure::Case,
        })
        .unwrap_err();
    assert!(err.is_config());
}

#[test]
fn generation_time_longer_than_period_is_rejected() {
    let config = ModelConfig {
        period: 12,
        generation_time: GenerationTimeConfig::Pmf {
            pmf: vec![1.0 / 12.0; 12],
        },
        ..unvaccinated_config()
    };
    let err = config.validate().unwrap_err();
    assert_eq!(err.info().code, "generation-time-support");
}

#[test]
fn tagged_enums_use_kebab_case_type_field() {
    let poisson = serde_json::to_value(Dispersion::Poisson).unwrap();
    assert_eq!(poisson, serde_json::json!({ "type": "poisson" }));
    let objective = serde_json::to_value(ObjectiveFunction::PeakPlusMean { mean_weight: 3.0 }).unwrap();
    assert_eq!(objective["type"], "peak-plus-mean");
}

#[test]
fn prebuilt_generation_time_gives_the_same_model() {
    let config = ModelConfig {
        period: 30,
        generation_time: GenerationTimeConfig::Pmf {
            pmf: vec![0.2, 0.5, 0.3],
        },
        ..unvaccinated_config()
    };
    let generation_time = config.validated_generation_time().unwrap();
    assert_eq!(generation_time, config.generation_time.build().unwrap());

    let susceptibility = vec![0.8; 30];
    let prebuilt = OutbreakRiskModel::from_parts(&config, generation_time.clone(), susceptibility.clone())
        .unwrap();
    let validated = OutbreakRiskModel::from_susceptibility(&config, susceptibility).unwrap();
    assert_eq!(prebuilt.generation_time(), validated.generation_time());
    assert_eq!(
        prebuilt.daily_reproduction_numbers(),
        validated.daily_reproduction_numbers()
    );
    assert_eq!(
        prebuilt.daily_case_outbreak_risk().unwrap(),
        validated.daily_case_outbreak_risk().unwrap()
    );

    let short = OutbreakRiskModel::from_parts(&config, generation_time, vec![0.8; 29]);
    assert!(short.unwrap_err().is_config());

    let invalid = ModelConfig {
        dispersion: Dispersion::NegativeBinomial { k: -1.0 },
        ..config
    };
    assert!(invalid.validated_generation_time().unwrap_err().is_config());
    assert!(OutbreakRiskModel::from_susceptibility(&invalid, vec![0.8; 30])
        .unwrap_err()
        .is_config());
}
