//! Periodic outbreak-risk model combining seasonal transmission and vaccination.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::{interp_periodic, require_unit_interval, ResultTable, RngHandle};
use vaxrisk_immune::{VaccinatedProfile, VaccinationCampaign};

use crate::branching::MonteCarloEstimate;
use crate::case_risk::case_outbreak_risk;
use crate::config::ModelConfig;
use crate::generation::GenerationTime;
use crate::objective::{ObjectiveConfig, RiskMeasure};
use crate::offspring::Dispersion;
use crate::renewal::{RenewalSimulator, SimulationConfig, SimulationOutcome};
use crate::risk::{instantaneous_outbreak_risk, SolverConfig};

/// Column names of [`RiskTrajectory::to_table`].
pub const TRAJECTORY_COLUMNS: [&str; 6] = [
    "time",
    "unvaccinated_reproduction_number",
    "reproduction_number",
    "susceptibility",
    "outbreak_risk",
    "case_outbreak_risk",
];

/// Computes the vaccinated profile required by `config`, or the unvaccinated one.
pub fn vaccinated_profile(config: &ModelConfig) -> Result<Arc<VaccinatedProfile>, VaxError> {
    let profile = match &config.immunity {
        Some(immunity) => VaccinatedProfile::compute(
            immunity,
            &config.susceptibility,
            config.period,
            &config.cohort,
        )?,
        None => VaccinatedProfile::unvaccinated(config.period),
    };
    Ok(Arc::new(profile))
}

/// Daily population susceptibility under `campaign`; all ones without immunity.
pub fn campaign_susceptibility(
    config: &ModelConfig,
    profile: &VaccinatedProfile,
    campaign: &VaccinationCampaign,
) -> Result<Vec<f64>, VaxError> {
    if config.immunity.is_none() {
        return Ok(vec![1.0; config.period]);
    }
    if profile.period() != config.period {
        return Err(VaxError::Config(
            ErrorInfo::new("profile-period", "profile period differs from the model period")
                .with_context("profile", profile.period())
                .with_context("model", config.period),
        ));
    }
    profile.campaign_susceptibility(campaign)
}

/// Daily reproduction numbers, susceptibility and solver settings for one scenario.
///
/// All daily vectors cover days `0..period` and are interpolated periodically
/// for other times. The model is immutable; changing an input means building a
/// new model.
#[derive(Debug, Clone)]
pub struct OutbreakRiskModel {
    unvaccinated: Vec<f64>,
    susceptibility: Vec<f64>,
    reproduction: Vec<f64>,
    seasonal_weights: Vec<f64>,
    generation_time: GenerationTime,
    dispersion: Dispersion,
    solver: SolverConfig,
}

impl OutbreakRiskModel {
    /// Builds the model, computing the vaccinated profile from the cohort.
    pub fn new(config: &ModelConfig) -> Result<Self, VaxError> {
        let generation_time = config.validated_generation_time()?;
        let profile = vaccinated_profile(config)?;
        let susceptibility = campaign_susceptibility(config, &profile, &config.campaign)?;
        Self::from_parts(config, generation_time, susceptibility)
    }

    /// Builds the model from a precomputed profile and the configured campaign.
    pub fn with_profile(config: &ModelConfig, profile: &VaccinatedProfile) -> Result<Self, VaxError> {
        Self::with_campaign(config, profile, &config.campaign)
    }

    /// Builds the model from a precomputed profile and an explicit campaign.
    pub fn with_campaign(
        config: &ModelConfig,
        profile: &VaccinatedProfile,
        campaign: &VaccinationCampaign,
    ) -> Result<Self, VaxError> {
        let generation_time = config.validated_generation_time()?;
        let susceptibility = campaign_susceptibility(config, profile, campaign)?;
        Self::from_parts(config, generation_time, susceptibility)
    }

    /// Builds the model from daily population susceptibility values.
    pub fn from_susceptibility(config: &ModelConfig, susceptibility: Vec<f64>) -> Result<Self, VaxError> {
        let generation_time = config.validated_generation_time()?;
        Self::from_parts(config, generation_time, susceptibility)
    }

    /// Builds the model from a configuration that already passed
    /// [`ModelConfig::validated_generation_time`] and the distribution it returned.
    ///
    /// Only the susceptibility values are checked.
    pub fn from_parts(
        config: &ModelConfig,
        generation_time: GenerationTime,
        susceptibility: Vec<f64>,
    ) -> Result<Self, VaxError> {
        if susceptibility.len() != config.period {
            return Err(VaxError::Config(
                ErrorInfo::new(
                    "susceptibility-length",
                    "one susceptibility value is required per day of the period",
                )
                .with_context("expected", config.period)
                .with_context("actual", susceptibility.len()),
            ));
        }
        for &value in &susceptibility {
            require_unit_interval("susceptibility", value)?;
        }
        let unvaccinated = config.reproduction.daily(config.period);
        let reproduction = unvaccinated
            .iter()
            .zip(&susceptibility)
            .map(|(r, s)| r * s)
            .collect();
        Ok(Self {
            seasonal_weights: config.reproduction.seasonal_weights(config.period),
            unvaccinated,
            susceptibility,
            reproduction,
            generation_time,
            dispersion: config.dispersion,
            solver: config.solver,
        })
    }

    /// Days per period.
    pub fn period(&self) -> usize {
        self.reproduction.len()
    }

    /// Daily effective reproduction numbers.
    pub fn daily_reproduction_numbers(&self) -> &[f64] {
        &self.reproduction
    }

    /// Daily population susceptibility.
    pub fn daily_susceptibility(&self) -> &[f64] {
        &self.susceptibility
    }

    /// Generation-time distribution in use.
    pub fn generation_time(&self) -> &GenerationTime {
        &self.generation_time
    }

    /// Unvaccinated reproduction number at each time.
    pub fn unvaccinated_reproduction_number(&self, times: &[f64]) -> Vec<f64> {
        interpolate(&self.unvaccinated, times)
    }

    /// Effective reproduction number at each time.
    pub fn reproduction_number(&self, times: &[f64]) -> Vec<f64> {
        interpolate(&self.reproduction, times)
    }

    /// Population susceptibility at each time.
    pub fn susceptibility(&self, times: &[f64]) -> Vec<f64> {
        interpolate(&self.susceptibility, times)
    }

    /// Instantaneous outbreak risk at each time.
    pub fn instantaneous_outbreak_risk(&self, times: &[f64]) -> Result<Vec<f64>, VaxError> {
        self.reproduction_number(times)
            .into_iter()
            .map(|r| instantaneous_outbreak_risk(r, &self.dispersion, &self.solver))
            .collect()
    }

    /// Case outbreak risk on days `0..period`.
    pub fn daily_case_outbreak_risk(&self) -> Result<Vec<f64>, VaxError> {
        case_outbreak_risk(
            &self.reproduction,
            &self.generation_time,
            &self.dispersion,
            &self.solver,
        )
    }

    /// Case outbreak risk at each time.
    pub fn case_outbreak_risk(&self, times: &[f64]) -> Result<Vec<f64>, VaxError> {
        let daily = self.daily_case_outbreak_risk()?;
        Ok(interpolate(&daily, times))
    }

    /// Daily risk of the chosen measure.
    pub fn daily_risk(&self, measure: RiskMeasure) -> Result<Vec<f64>, VaxError> {
        match measure {
            RiskMeasure::Case => self.daily_case_outbreak_risk(),
            RiskMeasure::Instantaneous => {
                let days: Vec<f64> = (0..self.period()).map(|day| day as f64).collect();
                self.instantaneous_outbreak_risk(&days)
            }
        }
    }

    /// Objective value over one period.
    pub fn objective_value(&self, objective: &ObjectiveConfig) -> Result<f64, VaxError> {
        objective.function.validate(self.period())?;
        let risk = self.daily_risk(objective.measure)?;
        let value = objective.function.evaluate(&risk, &self.seasonal_weights);
        debug!(objective = objective.function.label(), value, "objective evaluated");
        Ok(value)
    }

    /// Renewal simulator over this model's daily reproduction numbers.
    pub fn simulator(&self) -> Result<RenewalSimulator<'_>, VaxError> {
        RenewalSimulator::new(&self.reproduction, &self.generation_time, self.dispersion)
    }

    /// Simulated case outbreak risk at each start time.
    pub fn simulated_outbreak_risk(
        &self,
        times: &[f64],
        config: &SimulationConfig,
    ) -> Result<Vec<MonteCarloEstimate>, VaxError> {
        self.simulator()?.simulated_outbreak_risk(times, config)
    }

    /// One simulated epidemic from a case at `start_time`, seeded from substream `run`.
    pub fn simulate(
        &self,
        start_time: f64,
        config: &SimulationConfig,
        run: u64,
    ) -> Result<SimulationOutcome, VaxError> {
        config.validate()?;
        let mut rng = RngHandle::substream(config.seed, run);
        self.simulator()?.simulate(start_time, config, &mut rng)
    }

    /// Full trajectory at the given times.
    pub fn trajectory(&self, times: &[f64]) -> Result<RiskTrajectory, VaxError> {
        Ok(RiskTrajectory {
            time: times.to_vec(),
            unvaccinated_reproduction_number: self.unvaccinated_reproduction_number(times),
            reproduction_number: self.reproduction_number(times),
            susceptibility: self.susceptibility(times),
            outbreak_risk: self.instantaneous_outbreak_risk(times)?,
            case_outbreak_risk: self.case_outbreak_risk(times)?,
        })
    }
}

fn interpolate(daily: &[f64], times: &[f64]) -> Vec<f64> {
    times.iter().map(|&t| interp_periodic(daily, t)).collect()
}

/// Time series of reproduction numbers, susceptibility and both outbreak risks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTrajectory {
    /// Evaluation times.
    pub time: Vec<f64>,
    /// Baseline seasonal reproduction number.
    pub unvaccinated_reproduction_number: Vec<f64>,
    /// Effective reproduction number.
    pub reproduction_number: Vec<f64>,
    /// Population susceptibility.
    pub susceptibility: Vec<f64>,
    /// Instantaneous outbreak risk.
    pub outbreak_risk: Vec<f64>,
    /// Case outbreak risk.
    pub case_outbreak_risk: Vec<f64>,
}

impl RiskTrajectory {
    /// Table with the [`TRAJECTORY_COLUMNS`].
    pub fn to_table(&self) -> Result<ResultTable, VaxError> {
        let columns = [
            &self.time,
            &self.unvaccinated_reproduction_number,
            &self.reproduction_number,
            &self.susceptibility,
            &self.outbreak_risk,
            &self.case_outbreak_risk,
        ];
        ResultTable::from_columns(
            TRAJECTORY_COLUMNS
                .iter()
                .zip(columns)
                .map(|(name, values)| (name.to_string(), values.clone()))
                .collect(),
        )
    }

    /// Largest case outbreak risk.
    pub fn peak_case_outbreak_risk(&self) -> f64 {
        self.case_outbreak_risk
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}
