//! Day-by-day stochastic renewal simulation with overdispersed transmission.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::{derive_nested_seed, interp_periodic, RngHandle, ResultTable};

use crate::branching::{MonteCarloEstimate, TrialStatus};
use crate::generation::GenerationTime;
use crate::offspring::{sample_poisson, Dispersion};

fn default_incidence_cutoff() -> u64 {
    30
}

fn default_simulations() -> u64 {
    20_000
}

fn default_max_days() -> u32 {
    3650
}

fn default_seed() -> u64 {
    2
}

/// Settings of the renewal simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Daily incidence at or above which a run is a major outbreak.
    #[serde(default = "default_incidence_cutoff")]
    pub incidence_cutoff: u64,
    /// Simulations per start time.
    #[serde(default = "default_simulations")]
    pub simulations: u64,
    /// Days simulated before a run is flagged unresolved.
    #[serde(default = "default_max_days")]
    pub max_days: u32,
    /// Master seed.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            incidence_cutoff: default_incidence_cutoff(),
            simulations: default_simulations(),
            max_days: default_max_days(),
            seed: default_seed(),
        }
    }
}

impl SimulationConfig {
    /// Rejects zero cutoffs, simulation counts or day caps.
    pub fn validate(&self) -> Result<(), VaxError> {
        if self.incidence_cutoff == 0 || self.simulations == 0 || self.max_days == 0 {
            return Err(VaxError::Config(ErrorInfo::new(
                "simulation-setting",
                "incidence cutoff, simulation count and day cap must be positive",
            )));
        }
        Ok(())
    }
}

/// One simulated epidemic started by a single case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Day of the initial case.
    pub start_time: f64,
    /// Daily incidence starting with the initial case.
    pub incidence: Vec<u64>,
    /// How the run ended.
    pub status: TrialStatus,
}

impl SimulationOutcome {
    /// Table with columns `time` and `incidence`.
    pub fn to_table(&self) -> Result<ResultTable, VaxError> {
        ResultTable::from_columns(vec![
            (
                "time".to_string(),
                (0..self.incidence.len())
                    .map(|day| self.start_time + day as f64)
                    .collect(),
            ),
            (
                "incidence".to_string(),
                self.incidence.iter().map(|&cases| cases as f64).collect(),
            ),
        ])
    }
}

/// Renewal model with a periodic daily reproduction number.
#[derive(Debug, Clone)]
pub struct RenewalSimulator<'a> {
    reproduction_numbers: &'a [f64],
    generation_time: &'a GenerationTime,
    dispersion: Dispersion,
}

impl<'a> RenewalSimulator<'a> {
    /// `reproduction_numbers[d]` is R on day `d` of the period.
    pub fn new(
        reproduction_numbers: &'a [f64],
        generation_time: &'a GenerationTime,
        dispersion: Dispersion,
    ) -> Result<Self, VaxError> {
        dispersion.validate()?;
        if reproduction_numbers.is_empty() {
            return Err(VaxError::Config(ErrorInfo::new(
                "reproduction-empty",
                "reproduction numbers must cover at least one day",
            )));
        }
        Ok(Self {
            reproduction_numbers,
            generation_time,
            dispersion,
        })
    }

    fn period(&self) -> usize {
        self.reproduction_numbers.len()
    }

    /// Simulates from one case at `start_time`.
    ///
    /// `I_t ~ Poisson(R(t) Σ_s w_s Ĩ_{t−s})` with `Ĩ_t ~ Gamma(I_t k, 1/k)`.
    pub fn simulate(
        &self,
        start_time: f64,
        config: &SimulationConfig,
        rng: &mut RngHandle,
    ) -> Result<SimulationOutcome, VaxError> {
        let support = self.generation_time.max_days();
        let mut incidence = vec![1_u64];
        let mut weighted = vec![self.dispersion.infectiousness(1, rng)?];
        let mut status = TrialStatus::Unresolved;
        for elapsed in 1..=config.max_days as usize {
            let time = start_time + elapsed as f64;
            let r = interp_periodic(self.reproduction_numbers, time);
            let lookback = elapsed.min(support);
            let pressure: f64 = (1..=lookback)
                .map(|lag| self.generation_time.probability(lag) * weighted[elapsed - lag])
                .sum();
            let cases = sample_poisson(r * pressure, rng)?;
            incidence.push(cases);
            weighted.push(self.dispersion.infectiousness(cases, rng)?);
            if cases >= config.incidence_cutoff {
                status = TrialStatus::Outbreak;
                break;
            }
            if elapsed > support && incidence[incidence.len() - support..].iter().all(|&c| c == 0) {
                status = TrialStatus::Extinct;
                break;
            }
        }
        Ok(SimulationOutcome {
            start_time,
            incidence,
            status,
        })
    }

    /// Simulated case outbreak risk for each start time.
    ///
    /// Times equal modulo the period share one estimate. The runs for start time
    /// `t` use seeds derived from `(config.seed, t mod period, run)`, so estimates
    /// do not depend on which other times are requested.
    pub fn simulated_outbreak_risk(
        &self,
        times: &[f64],
        config: &SimulationConfig,
    ) -> Result<Vec<MonteCarloEstimate>, VaxError> {
        config.validate()?;
        let period = self.period() as f64;
        let mut estimates: BTreeMap<u64, MonteCarloEstimate> = BTreeMap::new();
        for &time in times {
            assert!(time.is_finite(), "simulation start times must be finite");
            let reduced = reduce_time(time, period);
            let key = reduced.to_bits();
            if estimates.contains_key(&key) {
                continue;
            }
            let statuses: Vec<TrialStatus> = (0..config.simulations)
                .into_par_iter()
                .map(|run| {
                    let mut rng = RngHandle::from_seed(derive_nested_seed(config.seed, key, run));
                    self.simulate(reduced, config, &mut rng).map(|outcome| outcome.status)
                })
                .collect::<Result<_, _>>()?;
            let estimate = MonteCarloEstimate::from_statuses(&statuses);
            if estimate.unresolved > 0 {
                warn!(
                    start_time = reduced,
                    unresolved = estimate.unresolved,
                    max_days = config.max_days,
                    "simulations hit the day cap and were counted as outbreaks"
                );
            }
            debug!(start_time = reduced, fraction = estimate.fraction, "simulated outbreak risk");
            estimates.insert(key, estimate);
        }
        Ok(times
            .iter()
            .map(|&time| estimates[&reduce_time(time, period).to_bits()])
            .collect())
    }
}

fn reduce_time(time: f64, period: f64) -> f64 {
    // Adding zero maps -0.0 onto 0.0 so both share a key.
    time.rem_euclid(period) + 0.0
}
