//! Sensitivity axes and the labelled scenarios they expand into.

use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_transmission::{december_january, Dispersion, ModelConfig, ObjectiveFunction};

/// Identifies a scenario by the axis it varies and the position of its value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScenarioLabel {
    /// Axis name, or `baseline`.
    pub axis: String,
    /// Index of the value along the axis.
    pub index: usize,
    /// Human readable value.
    pub value: String,
}

impl ScenarioLabel {
    /// Label of the unmodified configuration.
    pub fn baseline() -> Self {
        Self {
            axis: "baseline".to_string(),
            index: 0,
            value: "default".to_string(),
        }
    }
}

/// Configuration together with its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Where the scenario sits in the sweep.
    pub label: ScenarioLabel,
    /// Configuration evaluated for the scenario.
    pub config: ModelConfig,
}

/// One varied input; every value yields one scenario derived from the base configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SweepAxis {
    /// Temporal mean of the unvaccinated reproduction number.
    ReproductionMean {
        /// Values tried.
        values: Vec<f64>,
    },
    /// Proportional seasonal variation of the reproduction number.
    SeasonalVariation {
        /// Values tried.
        values: Vec<f64>,
    },
    /// Negative binomial dispersion `k`.
    Dispersion {
        /// Values tried.
        values: Vec<f64>,
    },
    /// Fraction vaccinated each period.
    Coverage {
        /// Values tried.
        values: Vec<f64>,
    },
    /// Titer giving 50% protection.
    HalfProtectionTiter {
        /// Values tried.
        values: Vec<f64>,
    },
    /// Objective minimised by the optimiser.
    Objective {
        /// Objectives tried.
        functions: Vec<ObjectiveFunction>,
    },
    /// Joint grid over the mean and seasonal variation of the reproduction number.
    UnvaccinatedReproduction {
        /// Means tried.
        means: Vec<f64>,
        /// Variations tried for every mean.
        variations: Vec<f64>,
    },
}

impl SweepAxis {
    /// Stable axis name used in labels.
    pub fn name(&self) -> &'static str {
        match self {
            SweepAxis::ReproductionMean { .. } => "reproduction_mean",
            SweepAxis::SeasonalVariation { .. } => "seasonal_variation",
            SweepAxis::Dispersion { .. } => "dispersion",
            SweepAxis::Coverage { .. } => "coverage",
            SweepAxis::HalfProtectionTiter { .. } => "half_protection_titer",
            SweepAxis::Objective { .. } => "objective",
            SweepAxis::UnvaccinatedReproduction { .. } => "unvaccinated_reproduction",
        }
    }

    /// Scenarios in value order, each validated.
    pub fn scenarios(&self, base: &ModelConfig) -> Result<Vec<Scenario>, VaxError> {
        let variants: Vec<(String, ModelConfig)> = match self {
            SweepAxis::ReproductionMean { values } => numeric(values, base, |config, value| {
                config.reproduction.mean = value;
            }),
            SweepAxis::SeasonalVariation { values } => numeric(values, base, |config, value| {
                config.reproduction.proportional_variation = value;
            }),
            SweepAxis::Dispersion { values } => numeric(values, base, |config, value| {
                config.dispersion = Dispersion::negative_binomial(value);
            }),
            SweepAxis::Coverage { values } => numeric(values, base, |config, value| {
                config.campaign.coverage = value;
            }),
            SweepAxis::HalfProtectionTiter { values } => numeric(values, base, |config, value| {
                config.susceptibility.half_protection_titer = value;
            }),
            SweepAxis::Objective { functions } => functions
                .iter()
                .map(|function| {
                    let mut config = base.clone();
                    config.objective.function = function.clone();
                    (objective_value_label(function), config)
                })
                .collect(),
            SweepAxis::UnvaccinatedReproduction { means, variations } => means
                .iter()
                .flat_map(|&mean| variations.iter().map(move |&variation| (mean, variation)))
                .map(|(mean, variation)| {
                    let mut config = base.clone();
                    config.reproduction.mean = mean;
                    config.reproduction.proportional_variation = variation;
                    (format!("mean={mean},variation={variation}"), config)
                })
                .collect(),
        };
        if variants.is_empty() {
            return Err(VaxError::Config(
                ErrorInfo::new("axis-empty", "sweep axis has no values")
                    .with_context("axis", self.name()),
            ));
        }
        variants
            .into_iter()
            .enumerate()
            .map(|(index, (value, config))| {
                config.validate().map_err(|err| {
                    VaxError::Config(
                        err.info()
                            .clone()
                            .with_context("axis", self.name())
                            .with_context("index", index),
                    )
                })?;
                Ok(Scenario {
                    label: ScenarioLabel {
                        axis: self.name().to_string(),
                        index,
                        value,
                    },
                    config,
                })
            })
            .collect()
    }
}

fn numeric(
    values: &[f64],
    base: &ModelConfig,
    apply: impl Fn(&mut ModelConfig, f64),
) -> Vec<(String, ModelConfig)> {
    values
        .iter()
        .map(|&value| {
            let mut config = base.clone();
            apply(&mut config, value);
            (value.to_string(), config)
        })
        .collect()
}

fn objective_value_label(function: &ObjectiveFunction) -> String {
    match function {
        ObjectiveFunction::PeakPlusMean { mean_weight } => {
            format!("{}:{mean_weight}", function.label())
        }
        other => other.label().to_string(),
    }
}

/// Objective family explored by the objective sensitivity analysis.
pub fn objective_family(period: usize) -> Vec<ObjectiveFunction> {
    let winter = december_january(period);
    vec![
        ObjectiveFunction::Mean,
        ObjectiveFunction::WindowMean {
            windows: winter.clone(),
        },
        ObjectiveFunction::SeasonalWeightedMean,
        ObjectiveFunction::PeakPlusMean {
            mean_weight: 1.0 / 3.0,
        },
        ObjectiveFunction::PeakPlusMean { mean_weight: 1.0 },
        ObjectiveFunction::PeakPlusMean { mean_weight: 3.0 },
        ObjectiveFunction::PeakPlusWindowMean { windows: winter },
    ]
}

/// Reference sensitivity axes.
pub fn reference_axes(period: usize) -> Vec<SweepAxis> {
    vec![
        SweepAxis::ReproductionMean {
            values: vec![2.0, 3.0],
        },
        SweepAxis::SeasonalVariation {
            values: vec![0.1, 0.3],
        },
        SweepAxis::Dispersion {
            values: vec![0.23, 0.60],
        },
        SweepAxis::Coverage {
            values: vec![0.4, 0.8],
        },
        SweepAxis::HalfProtectionTiter {
            values: vec![500.0, 2000.0],
        },
        SweepAxis::Objective {
            functions: objective_family(period),
        },
        SweepAxis::UnvaccinatedReproduction {
            means: vec![1.0, 2.0, 3.0],
            variations: vec![0.1, 0.25, 0.4],
        },
    ]
}
