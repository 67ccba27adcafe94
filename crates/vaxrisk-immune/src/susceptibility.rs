//! Hill-type dose-response map from antibody titer to relative susceptibility.

use std::f64::consts::LN_10;

use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::VaxError;
use vaxrisk_core::require_positive;

fn default_half_protection_titer() -> f64 {
    1000.0
}

fn default_steepness() -> f64 {
    3.1 / LN_10
}

/// `S(A) = 1 / (1 + (A / half_protection_titer)^steepness)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HillSusceptibility {
    /// Titer giving 50% protection.
    #[serde(default = "default_half_protection_titer")]
    pub half_protection_titer: f64,
    /// Hill coefficient.
    #[serde(default = "default_steepness")]
    pub steepness: f64,
}

impl Default for HillSusceptibility {
    fn default() -> Self {
        Self {
            half_protection_titer: default_half_protection_titer(),
            steepness: default_steepness(),
        }
    }
}

impl HillSusceptibility {
    /// Rejects non-positive half-protection titer or steepness.
    pub fn validate(&self) -> Result<(), VaxError> {
        require_positive("half_protection_titer", self.half_protection_titer)?;
        require_positive("steepness", self.steepness)
    }

    /// Relative susceptibility in `[0, 1]`.
    ///
    /// # Panics
    ///
    /// Panics on a negative or NaN titer.
    pub fn susceptibility(&self, titer: f64) -> f64 {
        assert!(
            titer >= 0.0,
            "susceptibility requires a non-negative titer, got {titer}"
        );
        if titer == 0.0 {
            return 1.0;
        }
        let ratio = (titer / self.half_protection_titer).powf(self.steepness);
        if ratio.is_infinite() {
            0.0
        } else {
            1.0 / (1.0 + ratio)
        }
    }

    /// Maps every titer of a slice.
    pub fn susceptibility_vec(&self, titers: &[f64]) -> Vec<f64> {
        titers.iter().map(|&titer| self.susceptibility(titer)).collect()
    }
}
