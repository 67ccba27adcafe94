//! Immutable model configuration threaded through every computation.

use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::{from_yaml_str, stable_hash_string};
use vaxrisk_immune::{CohortConfig, HillSusceptibility, PopulationImmunity, VaccinationCampaign};

use crate::branching::BranchingConfig;
use crate::generation::{GenerationTime, GenerationTimeConfig};
use crate::objective::ObjectiveConfig;
use crate::offspring::Dispersion;
use crate::renewal::SimulationConfig;
use crate::reproduction::SeasonalReproduction;
use crate::risk::SolverConfig;

fn default_period() -> usize {
    365
}

fn default_immunity() -> Option<PopulationImmunity> {
    Some(PopulationImmunity::default())
}

/// Complete configuration of the outbreak-risk model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Days after which transmission and vaccination repeat.
    #[serde(default = "default_period")]
    pub period: usize,
    /// Seasonal unvaccinated reproduction number.
    #[serde(default)]
    pub reproduction: SeasonalReproduction,
    /// Offspring dispersion mode.
    #[serde(default)]
    pub dispersion: Dispersion,
    /// Generation-time distribution.
    #[serde(default)]
    pub generation_time: GenerationTimeConfig,
    /// Population kinetics; `None` models a population that is never vaccinated.
    #[serde(default = "default_immunity")]
    pub immunity: Option<PopulationImmunity>,
    /// Titer-to-susceptibility map.
    #[serde(default)]
    pub susceptibility: HillSusceptibility,
    /// Yearly vaccination campaign.
    #[serde(default)]
    pub campaign: VaccinationCampaign,
    /// Cohort used to compute the vaccinated profile.
    #[serde(default)]
    pub cohort: CohortConfig,
    /// Outbreak-risk solver settings.
    #[serde(default)]
    pub solver: SolverConfig,
    /// Renewal simulation settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Branching Monte Carlo settings.
    #[serde(default)]
    pub branching: BranchingConfig,
    /// Objective minimised by the optimiser.
    #[serde(default)]
    pub objective: ObjectiveConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            period: default_period(),
            reproduction: SeasonalReproduction::default(),
            dispersion: Dispersion::default(),
            generation_time: GenerationTimeConfig::default(),
            immunity: default_immunity(),
            susceptibility: HillSusceptibility::default(),
            campaign: VaccinationCampaign::default(),
            cohort: CohortConfig::default(),
            solver: SolverConfig::default(),
            simulation: SimulationConfig::default(),
            branching: BranchingConfig::default(),
            objective: ObjectiveConfig::default(),
        }
    }
}

impl ModelConfig {
    /// Parses a YAML document and validates it.
    pub fn from_yaml_str(data: &str) -> Result<Self, VaxError> {
        let config: Self = from_yaml_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Fails fast on the first invalid value.
    pub fn validate(&self) -> Result<(), VaxError> {
        self.validated_generation_time().map(|_| ())
    }

    /// Validates the configuration and returns the generation-time distribution
    /// it builds on the way.
    pub fn validated_generation_time(&self) -> Result<GenerationTime, VaxError> {
        if self.period == 0 {
            return Err(VaxError::Config(ErrorInfo::new(
                "period",
                "period must be at least one day",
            )));
        }
        self.reproduction.validate()?;
        self.dispersion.validate()?;
        let generation_time = self.generation_time.build()?;
        if generation_time.max_days() >= self.period {
            return Err(VaxError::Config(
                ErrorInfo::new(
                    "generation-time-support",
                    "maximum generation time must be shorter than the period",
                )
                .with_context("max_generation_time", generation_time.max_days())
                .with_context("period", self.period),
            ));
        }
        if let Some(immunity) = &self.immunity {
            immunity.validate()?;
        }
        self.susceptibility.validate()?;
        self.campaign.validate()?;
        self.cohort.validate()?;
        self.solver.validate()?;
        self.simulation.validate()?;
        self.branching.validate()?;
        self.objective.function.validate(self.period)?;
        Ok(generation_time)
    }

    /// Stable hash of the configuration used for provenance and caching.
    pub fn config_hash(&self) -> Result<String, VaxError> {
        stable_hash_string(self)
    }

    /// Hash of the parts that determine the vaccinated profile.
    pub fn profile_hash(&self) -> Result<String, VaxError> {
        stable_hash_string(&(
            self.period,
            &self.immunity,
            &self.susceptibility,
            &self.cohort,
        ))
    }
}
