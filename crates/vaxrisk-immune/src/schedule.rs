//! Vaccination schedules and pre-existing immunity.

use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::{require_non_negative, require_positive};

fn schedule_error(code: &str, message: impl Into<String>) -> VaxError {
    VaxError::Config(ErrorInfo::new(code, message))
}

fn default_potency() -> f64 {
    1.0
}

/// A single vaccine dose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dose {
    /// Administration time (days).
    pub time: f64,
    /// Relative potency scaling the dose amount (1 = reference dose).
    #[serde(default = "default_potency")]
    pub potency: f64,
}

impl Dose {
    /// Reference-potency dose at `time`.
    pub fn at(time: f64) -> Self {
        Self {
            time,
            potency: default_potency(),
        }
    }
}

/// Titer present before the first dose of a schedule.
///
/// The titer is held constant for times before `time` and decays with the
/// kinetics model's natural antibody decay afterwards until a dose is given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PreExistingImmunity {
    /// Titer at `time`.
    pub titer: f64,
    /// Reference time of the measurement.
    pub time: f64,
}

/// Ordered dose history of one individual.
///
/// Dose times are non-negative unless the schedule was built for burn-in
/// (see [`VaccinationSchedule::with_burn_in`]), and always strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VaccinationSchedule {
    doses: Vec<Dose>,
    #[serde(default)]
    pre_existing: PreExistingImmunity,
}

impl VaccinationSchedule {
    /// Builds a schedule from explicit doses, rejecting negative or unordered times.
    pub fn new(doses: Vec<Dose>) -> Result<Self, VaxError> {
        for dose in &doses {
            require_non_negative("dose_time", dose.time)?;
        }
        Self::with_burn_in(doses)
    }

    /// Builds a schedule from reference-potency dose times.
    pub fn from_times(times: &[f64]) -> Result<Self, VaxError> {
        Self::new(times.iter().copied().map(Dose::at).collect())
    }

    /// Builds a schedule that may include doses before time zero, as used for
    /// burn-in of periodic schedules.
    pub fn with_burn_in(doses: Vec<Dose>) -> Result<Self, VaxError> {
        for dose in &doses {
            if !dose.time.is_finite() {
                return Err(VaxError::Config(
                    ErrorInfo::new("dose-time", "dose times must be finite")
                        .with_context("time", dose.time),
                ));
            }
            require_positive("dose_potency", dose.potency)?;
        }
        for pair in doses.windows(2) {
            if pair[1].time <= pair[0].time {
                return Err(VaxError::Config(
                    ErrorInfo::new("schedule-order", "dose times must be strictly increasing")
                        .with_context("previous", pair[0].time)
                        .with_context("next", pair[1].time),
                ));
            }
        }
        Ok(Self {
            doses,
            pre_existing: PreExistingImmunity::default(),
        })
    }

    /// Schedule without doses (natural immunity only).
    pub fn unvaccinated() -> Self {
        Self::default()
    }

    /// Attaches pre-existing immunity; its reference time may not follow the first dose.
    pub fn with_pre_existing(mut self, pre_existing: PreExistingImmunity) -> Result<Self, VaxError> {
        require_non_negative("pre_existing_titer", pre_existing.titer)?;
        if !pre_existing.time.is_finite() {
            return Err(schedule_error("pre-existing-time", "reference time must be finite"));
        }
        if let Some(first) = self.doses.first() {
            if pre_existing.time > first.time {
                return Err(VaxError::Config(
                    ErrorInfo::new(
                        "pre-existing-after-dose",
                        "pre-existing immunity must be recorded before the first dose",
                    )
                    .with_context("reference_time", pre_existing.time)
                    .with_context("first_dose", first.time),
                ));
            }
        }
        self.pre_existing = pre_existing;
        Ok(self)
    }

    /// Doses in administration order.
    pub fn doses(&self) -> &[Dose] {
        &self.doses
    }

    /// Pre-existing immunity descriptor.
    pub fn pre_existing(&self) -> PreExistingImmunity {
        self.pre_existing
    }

    /// Index of the latest dose given at or before `time`.
    pub fn latest_dose_index(&self, time: f64) -> Option<usize> {
        let count = self.doses.partition_point(|dose| dose.time <= time);
        count.checked_sub(1)
    }
}
