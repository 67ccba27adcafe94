//! Generation-by-generation Monte Carlo of the branching process.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::RngHandle;

use crate::offspring::{sample_poisson, Dispersion};

fn default_trials() -> u64 {
    10_000
}

fn default_outbreak_threshold() -> u64 {
    1000
}

fn default_max_generations() -> u32 {
    1000
}

fn default_initial_cases() -> u64 {
    1
}

fn default_seed() -> u64 {
    2
}

/// Number of cases a trial starts from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Introduction {
    /// Exactly `initial_cases` cases.
    #[default]
    Fixed,
    /// A Poisson number of cases with the given mean; a zero draw is an extinct trial.
    Poisson {
        /// Mean number of introduced cases.
        mean: f64,
    },
}

/// Settings of the branching-process Monte Carlo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchingConfig {
    /// Number of independent trials.
    #[serde(default = "default_trials")]
    pub trials: u64,
    /// Generation size at which a trial is declared an outbreak.
    #[serde(default = "default_outbreak_threshold")]
    pub outbreak_threshold: u64,
    /// Generations simulated before a trial is flagged unresolved.
    #[serde(default = "default_max_generations")]
    pub max_generations: u32,
    /// Cases introduced in generation zero under [`Introduction::Fixed`].
    #[serde(default = "default_initial_cases")]
    pub initial_cases: u64,
    /// Whether generation zero is fixed or drawn per trial.
    #[serde(default)]
    pub introduction: Introduction,
    /// Master seed; trial `i` uses substream `i`.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for BranchingConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            outbreak_threshold: default_outbreak_threshold(),
            max_generations: default_max_generations(),
            initial_cases: default_initial_cases(),
            introduction: Introduction::default(),
            seed: default_seed(),
        }
    }
}

impl BranchingConfig {
    /// Rejects zero trials, thresholds, generation caps or introductions, and a
    /// non-positive Poisson introduction mean.
    pub fn validate(&self) -> Result<(), VaxError> {
        let zero = [
            ("trials", self.trials == 0),
            ("outbreak_threshold", self.outbreak_threshold == 0),
            ("max_generations", self.max_generations == 0),
            ("initial_cases", self.initial_cases == 0),
        ];
        if let Some((name, _)) = zero.iter().find(|(_, is_zero)| *is_zero) {
            return Err(VaxError::Config(
                ErrorInfo::new("branching-setting", "Monte Carlo settings must be positive")
                    .with_context("parameter", name),
            ));
        }
        if let Introduction::Poisson { mean } = self.introduction {
            vaxrisk_core::require_positive("introduction_mean", mean)?;
        }
        Ok(())
    }

    /// Outbreak probability of a trial given the single-case risk `risk`:
    /// `1 − (1 − risk)^n` for `n` fixed cases, `1 − exp(−mean · risk)` for a
    /// Poisson introduction.
    pub fn introduction_risk(&self, risk: f64) -> f64 {
        match self.introduction {
            Introduction::Fixed => 1.0 - (1.0 - risk).powf(self.initial_cases as f64),
            Introduction::Poisson { mean } => -(-mean * risk).exp_m1(),
        }
    }

    fn draw_initial_cases(&self, rng: &mut RngHandle) -> Result<u64, VaxError> {
        match self.introduction {
            Introduction::Fixed => Ok(self.initial_cases),
            Introduction::Poisson { mean } => sample_poisson(mean, rng),
        }
    }
}

/// How a single stochastic run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrialStatus {
    /// The outbreak threshold was reached.
    Outbreak,
    /// Transmission died out.
    Extinct,
    /// The cap was hit first; counted as an outbreak.
    Unresolved,
}

impl TrialStatus {
    /// Whether the run counts towards the outbreak fraction.
    pub fn counts_as_outbreak(self) -> bool {
        !matches!(self, TrialStatus::Extinct)
    }
}

/// Empirical outbreak fraction with its Monte Carlo standard error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloEstimate {
    /// Fraction of trials counted as outbreaks.
    pub fraction: f64,
    /// `sqrt(p (1 − p) / n)`.
    pub standard_error: f64,
    /// Number of trials.
    pub trials: u64,
    /// Trials that reached the outbreak threshold or were unresolved.
    pub outbreaks: u64,
    /// Trials that hit the cap before resolving.
    pub unresolved: u64,
}

impl MonteCarloEstimate {
    /// Summarises trial outcomes.
    pub fn from_statuses(statuses: &[TrialStatus]) -> Self {
        let trials = statuses.len() as u64;
        let outbreaks = statuses
            .iter()
            .filter(|status| status.counts_as_outbreak())
            .count() as u64;
        let unresolved = statuses
            .iter()
            .filter(|status| **status == TrialStatus::Unresolved)
            .count() as u64;
        let fraction = if trials == 0 {
            0.0
        } else {
            outbreaks as f64 / trials as f64
        };
        let standard_error = if trials == 0 {
            0.0
        } else {
            (fraction * (1.0 - fraction) / trials as f64).sqrt()
        };
        Self {
            fraction,
            standard_error,
            trials,
            outbreaks,
            unresolved,
        }
    }
}

/// Runs one branching-process trial with a constant reproduction number.
pub fn simulate_trial(
    reproduction_number: f64,
    dispersion: &Dispersion,
    config: &BranchingConfig,
    rng: &mut RngHandle,
) -> Result<TrialStatus, VaxError> {
    let mut cases = config.draw_initial_cases(rng)?;
    for _ in 0..config.max_generations {
        if cases == 0 {
            return Ok(TrialStatus::Extinct);
        }
        if cases >= config.outbreak_threshold {
            return Ok(TrialStatus::Outbreak);
        }
        cases = dispersion.sample_offspring(cases, reproduction_number, rng)?;
    }
    Ok(match cases {
        0 => TrialStatus::Extinct,
        n if n >= config.outbreak_threshold => TrialStatus::Outbreak,
        _ => TrialStatus::Unresolved,
    })
}

/// Monte Carlo estimate of the outbreak probability for a constant reproduction number.
///
/// Trials run in parallel, trial `i` seeded from substream `i` of `config.seed`.
pub fn branching_outbreak_risk(
    reproduction_number: f64,
    dispersion: &Dispersion,
    config: &BranchingConfig,
) -> Result<MonteCarloEstimate, VaxError> {
    config.validate()?;
    dispersion.validate()?;
    if !(reproduction_number.is_finite() && reproduction_number >= 0.0) {
        return Err(vaxrisk_core::invalid_parameter(
            "negative",
            "reproduction_number",
            reproduction_number,
            "finite and >= 0",
        ));
    }
    info!(
        trials = config.trials,
        reproduction_number,
        "running branching-process Monte Carlo"
    );
    let statuses: Vec<TrialStatus> = (0..config.trials)
        .into_par_iter()
        .map(|trial| {
            let mut rng = RngHandle::substream(config.seed, trial);
            simulate_trial(reproduction_number, dispersion, config, &mut rng)
        })
        .collect::<Result<_, _>>()?;
    let estimate = MonteCarloEstimate::from_statuses(&statuses);
    if estimate.unresolved > 0 {
        warn!(
            unresolved = estimate.unresolved,
            max_generations = config.max_generations,
            "trials hit the generation cap and were counted as outbreaks"
        );
    }
    Ok(estimate)
}
