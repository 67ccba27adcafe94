//! Periodic booster schedules with burn-in.

use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::{ErrorInfo, VaxError};

use crate::schedule::{Dose, VaccinationSchedule};

/// Reference number of periods simulated before time zero.
pub const DEFAULT_BURN_IN_PERIODS: u32 = 5;

/// The same within-period dose times repeated every period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicSchedule {
    period: f64,
    times: Vec<f64>,
}

impl PeriodicSchedule {
    /// Within-period times must lie in `[0, period)` and be strictly increasing.
    pub fn new(period: f64, times: Vec<f64>) -> Result<Self, VaxError> {
        vaxrisk_core::require_positive("period", period)?;
        for &time in &times {
            if !(0.0..period).contains(&time) {
                return Err(VaxError::Config(
                    ErrorInfo::new(
                        "periodic-dose-time",
                        "vaccination times must lie between 0 and the period",
                    )
                    .with_context("time", time)
                    .with_context("period", period),
                ));
            }
        }
        if times.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(VaxError::Config(ErrorInfo::new(
                "schedule-order",
                "within-period vaccination times must be strictly increasing",
            )));
        }
        Ok(Self { period, times })
    }

    /// Period length in days.
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Within-period dose times.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Expands into a concrete schedule covering `[-burn_in_periods * period, horizon]`.
    pub fn expand(&self, burn_in_periods: u32, horizon: f64) -> Result<VaccinationSchedule, VaxError> {
        if !horizon.is_finite() {
            return Err(VaxError::Config(
                ErrorInfo::new("horizon", "expansion horizon must be finite")
                    .with_context("horizon", horizon),
            ));
        }
        let mut doses = Vec::new();
        let mut cycle = -i64::from(burn_in_periods);
        loop {
            let offset = cycle as f64 * self.period;
            if offset > horizon {
                break;
            }
            doses.extend(
                self.times
                    .iter()
                    .map(|&time| Dose::at(offset + time))
                    .filter(|dose| dose.time <= horizon),
            );
            cycle += 1;
        }
        VaccinationSchedule::with_burn_in(doses)
    }
}
