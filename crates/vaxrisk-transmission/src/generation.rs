//! Discrete generation-time distributions.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::{require_non_negative, require_positive};

/// Largest tail mass lost by truncation at `t_max` before discretisation fails.
pub const MAX_TRUNCATED_MASS: f64 = 1e-3;

const SIMPSON_INTERVALS: usize = 256;

fn generation_error(code: &str, message: impl Into<String>) -> VaxError {
    VaxError::Config(ErrorInfo::new(code, message))
}

fn default_log_mean() -> f64 {
    0.979396480343543
}

fn default_log_sd() -> f64 {
    0.470500197316974
}

fn default_t_max() -> usize {
    14
}

/// Source of the generation-time distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GenerationTimeConfig {
    /// Continuous log-normal discretised on days `1..=t_max`.
    LogNormal {
        /// Mean of the log generation time.
        #[serde(default = "default_log_mean")]
        log_mean: f64,
        /// Standard deviation of the log generation time.
        #[serde(default = "default_log_sd")]
        log_sd: f64,
        /// Largest generation time in days.
        #[serde(default = "default_t_max")]
        t_max: usize,
    },
    /// Explicit probabilities for days `1..=pmf.len()`.
    Pmf {
        /// Probability of each day, starting at day 1.
        pmf: Vec<f64>,
    },
}

impl Default for GenerationTimeConfig {
    fn default() -> Self {
        GenerationTimeConfig::LogNormal {
            log_mean: default_log_mean(),
            log_sd: default_log_sd(),
            t_max: default_t_max(),
        }
    }
}

impl GenerationTimeConfig {
    /// Builds the discrete distribution.
    pub fn build(&self) -> Result<GenerationTime, VaxError> {
        match self {
            GenerationTimeConfig::LogNormal {
                log_mean,
                log_sd,
                t_max,
            } => GenerationTime::discretise_log_normal(*log_mean, *log_sd, *t_max),
            GenerationTimeConfig::Pmf { pmf } => GenerationTime::from_pmf(pmf.clone()),
        }
    }
}

/// Generation-time probabilities `w_d` for days `d = 1..=t_max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationTime {
    pmf: Vec<f64>,
}

impl GenerationTime {
    /// Validates and wraps explicit day-1-based probabilities.
    pub fn from_pmf(pmf: Vec<f64>) -> Result<Self, VaxError> {
        if pmf.is_empty() {
            return Err(generation_error(
                "generation-time-empty",
                "generation time needs at least one day",
            ));
        }
        for &value in &pmf {
            require_non_negative("generation_time_probability", value)?;
        }
        let total: f64 = pmf.iter().sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(VaxError::Config(
                ErrorInfo::new(
                    "generation-time-normalisation",
                    "generation-time probabilities must sum to one",
                )
                .with_context("sum", total),
            ));
        }
        Ok(Self {
            pmf: pmf.into_iter().map(|value| value / total).collect(),
        })
    }

    /// Discretises a log-normal density with the interval weighting of Cori et al. (2013):
    /// `p(t) = ∫_{t−1}^{t+1} (1 − |t − y|) f(y) dy` for `t = 0..=t_max`.
    ///
    /// Mass at day 0 is folded into day 1 and the result renormalised.
    pub fn discretise_log_normal(log_mean: f64, log_sd: f64, t_max: usize) -> Result<Self, VaxError> {
        if !log_mean.is_finite() {
            return Err(generation_error("log-mean", "log_mean must be finite"));
        }
        require_positive("log_sd", log_sd)?;
        if t_max == 0 {
            return Err(generation_error("t-max", "t_max must be at least one day"));
        }
        let density = |y: f64| {
            if y <= 0.0 {
                0.0
            } else {
                let z = (y.ln() - log_mean) / log_sd;
                (-0.5 * z * z).exp() / (y * log_sd * (2.0 * PI).sqrt())
            }
        };
        let mut mass: Vec<f64> = (0..=t_max)
            .map(|day| {
                let t = day as f64;
                let rising = simpson(|y| (1.0 - (t - y)) * density(y), (t - 1.0).max(0.0), t);
                let falling = simpson(|y| (1.0 - (y - t)) * density(y), t, t + 1.0);
                rising + falling
            })
            .collect();
        let day_zero = mass.remove(0);
        mass[0] += day_zero;
        let total: f64 = mass.iter().sum();
        if 1.0 - total > MAX_TRUNCATED_MASS {
            return Err(VaxError::Config(
                ErrorInfo::new(
                    "generation-time-truncation",
                    "discretised probabilities do not sum close to one",
                )
                .with_context("sum", total)
                .with_hint("increase t_max"),
            ));
        }
        Ok(Self {
            pmf: mass.into_iter().map(|value| value / total).collect(),
        })
    }

    /// Largest generation time in days.
    pub fn max_days(&self) -> usize {
        self.pmf.len()
    }

    /// Probability of a generation time of `day` days (zero outside `1..=max_days`).
    pub fn probability(&self, day: usize) -> f64 {
        if day == 0 {
            0.0
        } else {
            self.pmf.get(day - 1).copied().unwrap_or(0.0)
        }
    }

    /// Probabilities for days `1..=max_days`.
    pub fn pmf(&self) -> &[f64] {
        &self.pmf
    }

    /// Mean generation time in days.
    pub fn mean(&self) -> f64 {
        self.pmf
            .iter()
            .enumerate()
            .map(|(idx, p)| (idx + 1) as f64 * p)
            .sum()
    }
}

fn simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64) -> f64 {
    if b <= a {
        return 0.0;
    }
    let h = (b - a) / SIMPSON_INTERVALS as f64;
    let mut total = f(a) + f(b);
    for idx in 1..SIMPSON_INTERVALS {
        let weight = if idx % 2 == 1 { 4.0 } else { 2.0 };
        total += weight * f(a + idx as f64 * h);
    }
    total * h / 3.0
}
