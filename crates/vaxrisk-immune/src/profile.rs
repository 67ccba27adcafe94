//! Cohort susceptibility profiles under periodic vaccination and campaign averaging.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::{interp_periodic, require_positive, require_unit_interval, ResultTable};

use crate::kinetics::{AntibodyKinetics, DEFAULT_MAX_STEP};
use crate::periodic::{PeriodicSchedule, DEFAULT_BURN_IN_PERIODS};
use crate::population::{PopulationImmunity, PopulationSampler};
use crate::schedule::VaccinationSchedule;
use crate::susceptibility::HillSusceptibility;

fn profile_error(code: &str, message: impl Into<String>) -> VaxError {
    VaxError::Config(ErrorInfo::new(code, message))
}

fn default_population_size() -> usize {
    10_000
}

fn default_seed() -> u64 {
    2
}

fn default_burn_in_periods() -> u32 {
    DEFAULT_BURN_IN_PERIODS
}

fn default_max_step() -> f64 {
    DEFAULT_MAX_STEP
}

/// Size, seeding and numerics of the simulated cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortConfig {
    /// Number of simulated individuals.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Master seed; individual `i` draws from substream `i`.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Periods of vaccination simulated before time zero.
    #[serde(default = "default_burn_in_periods")]
    pub burn_in_periods: u32,
    /// Maximal ODE step in days.
    #[serde(default = "default_max_step")]
    pub max_step: f64,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            seed: default_seed(),
            burn_in_periods: default_burn_in_periods(),
            max_step: default_max_step(),
        }
    }
}

impl CohortConfig {
    /// Rejects an empty cohort or a non-positive step.
    pub fn validate(&self) -> Result<(), VaxError> {
        if self.population_size == 0 {
            return Err(profile_error(
                "population-size",
                "cohort must contain at least one individual",
            ));
        }
        require_positive("max_step", self.max_step)
    }
}

/// Titers of every cohort member at `times`, one row per individual in index order.
pub fn cohort_titers(
    sampler: &PopulationSampler,
    schedule: &VaccinationSchedule,
    times: &[f64],
    cohort: &CohortConfig,
) -> Result<Vec<Vec<f64>>, VaxError> {
    cohort.validate()?;
    (0..cohort.population_size as u64)
        .into_par_iter()
        .map(|index| {
            let params = sampler.draw_individual(cohort.seed, index)?;
            params.titers(schedule, times, cohort.max_step)
        })
        .collect()
}

/// Mean cohort susceptibility on days `0..period` under a periodic schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinatedProfile {
    values: Vec<f64>,
}

impl VaccinatedProfile {
    /// Profile when every individual is vaccinated at day 0 of each period.
    pub fn compute(
        immunity: &PopulationImmunity,
        map: &HillSusceptibility,
        period: usize,
        cohort: &CohortConfig,
    ) -> Result<Self, VaxError> {
        let schedule = PeriodicSchedule::new(period as f64, vec![0.0])?;
        Self::compute_periodic(immunity, map, &schedule, cohort)
    }

    /// Profile for an arbitrary within-period schedule.
    pub fn compute_periodic(
        immunity: &PopulationImmunity,
        map: &HillSusceptibility,
        schedule: &PeriodicSchedule,
        cohort: &CohortConfig,
    ) -> Result<Self, VaxError> {
        map.validate()?;
        cohort.validate()?;
        let period = schedule.period().round() as usize;
        if period == 0 || schedule.period().fract() != 0.0 {
            return Err(profile_error(
                "profile-period",
                "profiles require a whole number of days per period",
            ));
        }
        info!(
            individuals = cohort.population_size,
            period,
            doses_per_period = schedule.times().len(),
            "computing vaccinated susceptibility profile"
        );
        let sampler = immunity.sampler()?;
        let times: Vec<f64> = (0..period).map(|day| day as f64).collect();
        let expanded = schedule.expand(cohort.burn_in_periods, (period - 1) as f64)?;
        let titers = cohort_titers(&sampler, &expanded, &times, cohort)?;

        let mut totals = vec![0.0; period];
        for individual in &titers {
            for (total, &titer) in totals.iter_mut().zip(individual) {
                *total += map.susceptibility(titer);
            }
        }
        let size = cohort.population_size as f64;
        let values: Vec<f64> = totals.into_iter().map(|total| total / size).collect();
        debug!(
            min = values.iter().cloned().fold(f64::INFINITY, f64::min),
            max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            "vaccinated profile range"
        );
        Ok(Self { values })
    }

    /// Wraps precomputed daily values, e.g. a profile persisted by the caller.
    pub fn from_values(values: Vec<f64>) -> Result<Self, VaxError> {
        if values.is_empty() {
            return Err(profile_error("profile-empty", "profile needs at least one day"));
        }
        for &value in &values {
            require_unit_interval("susceptibility", value)?;
        }
        Ok(Self { values })
    }

    /// Profile of a population that is never vaccinated.
    pub fn unvaccinated(period: usize) -> Self {
        Self {
            values: vec![1.0; period.max(1)],
        }
    }

    /// Days per period.
    pub fn period(&self) -> usize {
        self.values.len()
    }

    /// Daily values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Periodic linear interpolation at an arbitrary time.
    pub fn at(&self, time: f64) -> f64 {
        interp_periodic(&self.values, time)
    }

    /// Population susceptibility on days `0..period` under `campaign`.
    ///
    /// `S(t) = p · mean_v S₀(t − v) + (1 − p)` over vaccination days
    /// `v = start, start + 1, … < end`.
    pub fn campaign_susceptibility(&self, campaign: &VaccinationCampaign) -> Result<Vec<f64>, VaxError> {
        campaign.validate()?;
        let days = campaign.vaccination_days();
        let period = self.period();
        if days.is_empty() || campaign.coverage == 0.0 {
            return Ok(vec![1.0; period]);
        }
        let coverage = campaign.coverage;
        let count = days.len() as f64;
        Ok((0..period)
            .map(|day| {
                let t = day as f64;
                let vaccinated: f64 = days.iter().map(|&v| self.at(t - v)).sum::<f64>() / count;
                coverage * vaccinated + (1.0 - coverage)
            })
            .collect())
    }

    /// Table with columns `time` and `susceptibility`.
    pub fn to_table(&self) -> Result<ResultTable, VaxError> {
        ResultTable::from_columns(vec![
            (
                "time".to_string(),
                (0..self.period()).map(|day| day as f64).collect(),
            ),
            ("susceptibility".to_string(), self.values.clone()),
        ])
    }
}

fn default_campaign_start() -> f64 {
    273.0
}

fn default_campaign_end() -> f64 {
    349.0
}

fn default_coverage() -> f64 {
    0.6
}

/// Yearly vaccination window `[start, end)` reaching a fraction `coverage` of the population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VaccinationCampaign {
    /// First vaccination day.
    #[serde(default = "default_campaign_start")]
    pub start: f64,
    /// Exclusive end of the window.
    #[serde(default = "default_campaign_end")]
    pub end: f64,
    /// Fraction vaccinated each period.
    #[serde(default = "default_coverage")]
    pub coverage: f64,
}

impl Default for VaccinationCampaign {
    /// 1 October to 16 December on a no-leap calendar, 60% coverage.
    fn default() -> Self {
        Self {
            start: default_campaign_start(),
            end: default_campaign_end(),
            coverage: default_coverage(),
        }
    }
}

impl VaccinationCampaign {
    /// Campaign of `duration` days starting at `start`.
    pub fn from_start_duration(start: f64, duration: f64, coverage: f64) -> Self {
        Self {
            start,
            end: start + duration,
            coverage,
        }
    }

    /// No vaccination.
    pub fn none() -> Self {
        Self {
            start: 0.0,
            end: 0.0,
            coverage: 0.0,
        }
    }

    /// Rejects non-finite bounds, `end < start` and coverage outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), VaxError> {
        if !self.start.is_finite() || !self.end.is_finite() || self.end < self.start {
            return Err(VaxError::Config(
                ErrorInfo::new("campaign-window", "campaign window must satisfy start <= end")
                    .with_context("start", self.start)
                    .with_context("end", self.end),
            ));
        }
        require_unit_interval("coverage", self.coverage)
    }

    /// Vaccination days `start, start + 1, …` strictly before `end`.
    pub fn vaccination_days(&self) -> Vec<f64> {
        let count = (self.end - self.start).ceil().max(0.0) as usize;
        (0..count)
            .map(|offset| self.start + offset as f64)
            .filter(|&day| day < self.end)
            .collect()
    }
}
