//! Seasonal baseline reproduction number and individual-level heterogeneity.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::VaxError;
use vaxrisk_core::{require_non_negative, require_positive, require_unit_interval};

fn default_mean() -> f64 {
    2.5
}

fn default_variation() -> f64 {
    0.2
}

/// `R_unvacc(t) = mean · (1 + proportional_variation · cos(2π (t − peak_time) / period))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalReproduction {
    /// Temporal mean of the unvaccinated reproduction number.
    #[serde(default = "default_mean")]
    pub mean: f64,
    /// Proportion by which R varies above and below its mean.
    #[serde(default = "default_variation")]
    pub proportional_variation: f64,
    /// Day of peak transmission.
    #[serde(default)]
    pub peak_time: f64,
}

impl Default for SeasonalReproduction {
    fn default() -> Self {
        Self {
            mean: default_mean(),
            proportional_variation: default_variation(),
            peak_time: 0.0,
        }
    }
}

impl SeasonalReproduction {
    /// Mean must be non-negative and the variation in `[0, 1]`.
    pub fn validate(&self) -> Result<(), VaxError> {
        require_non_negative("reproduction_mean", self.mean)?;
        require_unit_interval("proportional_variation", self.proportional_variation)?;
        if !self.peak_time.is_finite() {
            return Err(vaxrisk_core::invalid_parameter(
                "non-finite",
                "peak_time",
                self.peak_time,
                "finite",
            ));
        }
        Ok(())
    }

    /// Value at time `t` for a cycle of `period` days.
    pub fn at(&self, t: f64, period: usize) -> f64 {
        let phase = 2.0 * PI * (t - self.peak_time) / period as f64;
        self.mean * (1.0 + self.proportional_variation * phase.cos())
    }

    /// Values on days `0..period`.
    pub fn daily(&self, period: usize) -> Vec<f64> {
        (0..period).map(|day| self.at(day as f64, period)).collect()
    }

    /// Seasonal weights: daily values shifted to a zero minimum and normalised.
    ///
    /// Without seasonal variation every day gets the same weight.
    pub fn seasonal_weights(&self, period: usize) -> Vec<f64> {
        let daily = self.daily(period);
        let min = daily.iter().cloned().fold(f64::INFINITY, f64::min);
        let shifted: Vec<f64> = daily.iter().map(|value| value - min).collect();
        let total: f64 = shifted.iter().sum();
        if total > 0.0 {
            shifted.into_iter().map(|value| value / total).collect()
        } else {
            vec![1.0 / period as f64; period]
        }
    }
}

/// Gamma-distributed individual reproduction numbers with mean `mean` and shape `dispersion`.
///
/// Mixing a Poisson offspring count over this distribution gives the negative
/// binomial offspring distribution with the same mean and dispersion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndividualReproduction {
    /// Population mean of individual reproduction numbers.
    pub mean: f64,
    /// Gamma shape parameter `k`.
    pub dispersion: f64,
}

impl IndividualReproduction {
    /// Matches a gamma distribution to a mean and variance.
    pub fn from_mean_variance(mean: f64, variance: f64) -> Result<Self, VaxError> {
        require_positive("reproduction_mean", mean)?;
        require_positive("reproduction_variance", variance)?;
        Ok(Self {
            mean,
            dispersion: mean * mean / variance,
        })
    }

    /// Variance `mean² / k`.
    pub fn variance(&self) -> f64 {
        self.mean * self.mean / self.dispersion
    }

    /// Variance of the negative binomial offspring count, `mean + mean² / k`.
    pub fn offspring_variance(&self) -> f64 {
        self.mean + self.variance()
    }
}
