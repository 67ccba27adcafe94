//! Offspring distributions of the branching process.

use rand::Rng;
use rand_distr::{Distribution, Gamma, Poisson};
use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::require_positive;

fn default_k() -> f64 {
    0.41
}

fn sampling_error(code: &str, err: impl ToString) -> VaxError {
    VaxError::Simulation(ErrorInfo::new(code, err.to_string()))
}

/// Dispersion mode of secondary-case counts with mean `R`.
///
/// The Poisson variant is the `k → ∞` limit, kept as its own branch so that no
/// formula is evaluated at extreme `k`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Dispersion {
    /// Negative binomial with dispersion `k`.
    NegativeBinomial {
        /// Dispersion parameter; smaller means more superspreading.
        #[serde(default = "default_k")]
        k: f64,
    },
    /// Poisson offspring (no individual heterogeneity).
    Poisson,
}

impl Default for Dispersion {
    fn default() -> Self {
        Dispersion::NegativeBinomial { k: default_k() }
    }
}

impl Dispersion {
    /// Negative binomial with dispersion `k`.
    pub fn negative_binomial(k: f64) -> Self {
        Dispersion::NegativeBinomial { k }
    }

    /// Rejects `k <= 0` or non-finite `k`.
    pub fn validate(&self) -> Result<(), VaxError> {
        match self {
            Dispersion::NegativeBinomial { k } => require_positive("dispersion_k", *k),
            Dispersion::Poisson => Ok(()),
        }
    }

    /// Probability that an individual whose infectees each seed an outbreak with
    /// probability `r` produces at least one outbreak, given mean offspring `mean`.
    ///
    /// Equals `1 − G(1 − r)` with `G` the offspring generating function, i.e.
    /// `1 − (1 + mean r / k)^(−k)` or `1 − exp(−mean r)`.
    pub fn escape_probability(&self, mean_times_risk: f64) -> f64 {
        match self {
            Dispersion::NegativeBinomial { k } => -(-k * (mean_times_risk / k).ln_1p()).exp_m1(),
            Dispersion::Poisson => -(-mean_times_risk).exp_m1(),
        }
    }

    /// Relative infectiousness-weighted count for `cases` new cases: a draw of
    /// `Gamma(cases · k, 1/k)`, or `cases` itself for Poisson offspring.
    pub fn infectiousness<R: Rng + ?Sized>(&self, cases: u64, rng: &mut R) -> Result<f64, VaxError> {
        if cases == 0 {
            return Ok(0.0);
        }
        match self {
            Dispersion::NegativeBinomial { k } => {
                let gamma = Gamma::new(cases as f64 * k, 1.0 / k)
                    .map_err(|err| sampling_error("gamma", err))?;
                Ok(gamma.sample(rng))
            }
            Dispersion::Poisson => Ok(cases as f64),
        }
    }

    /// Total offspring of `cases` individuals with mean reproduction number `r`.
    pub fn sample_offspring<R: Rng + ?Sized>(
        &self,
        cases: u64,
        r: f64,
        rng: &mut R,
    ) -> Result<u64, VaxError> {
        let intensity = self.infectiousness(cases, rng)? * r;
        sample_poisson(intensity, rng)
    }
}

/// Poisson draw that accepts a zero rate.
pub fn sample_poisson<R: Rng + ?Sized>(rate: f64, rng: &mut R) -> Result<u64, VaxError> {
    if rate <= 0.0 {
        return Ok(0);
    }
    let poisson = Poisson::new(rate).map_err(|err| sampling_error("poisson", err))?;
    let draw: f64 = poisson.sample(rng);
    Ok(draw as u64)
}
