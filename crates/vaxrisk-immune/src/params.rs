//! Individual-level pharmacokinetic parameters for the antibody models.

use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::{require_non_negative, require_positive};

/// Parameters of the mRNA-driven antibody production model.
///
/// Production follows a logistic response to the log amount of decaying vaccine
/// mRNA; antibodies decay at a constant per-capita rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrnaParams {
    /// Amount of mRNA delivered by a reference-potency dose.
    pub mrna_dose: f64,
    /// Exponential decay rate of vaccine mRNA (per day).
    pub mrna_decay_rate: f64,
    /// Delay between a dose and the onset of its antibody response (days).
    pub delay_to_antibody_response: f64,
    /// Maximal antibody production rate (titer units per day).
    pub max_antibody_production_rate: f64,
    /// Steepness of the logistic production response in log mRNA.
    pub mrna_response_steepness: f64,
    /// mRNA amount giving half-maximal production.
    pub half_maximal_response_mrna: f64,
    /// Antibody decay rate (per day).
    pub antibody_decay_rate: f64,
}

impl MrnaParams {
    /// Parameter names in canonical order.
    pub const NAMES: [&'static str; 7] = [
        "mrna_dose",
        "mrna_decay_rate",
        "delay_to_antibody_response",
        "max_antibody_production_rate",
        "mrna_response_steepness",
        "half_maximal_response_mrna",
        "antibody_decay_rate",
    ];

    fn values(&self) -> Vec<f64> {
        vec![
            self.mrna_dose,
            self.mrna_decay_rate,
            self.delay_to_antibody_response,
            self.max_antibody_production_rate,
            self.mrna_response_steepness,
            self.half_maximal_response_mrna,
            self.antibody_decay_rate,
        ]
    }

    fn from_values(values: &[f64]) -> Self {
        Self {
            mrna_dose: values[0],
            mrna_decay_rate: values[1],
            delay_to_antibody_response: values[2],
            max_antibody_production_rate: values[3],
            mrna_response_steepness: values[4],
            half_maximal_response_mrna: values[5],
            antibody_decay_rate: values[6],
        }
    }

    fn validate(&self) -> Result<(), VaxError> {
        require_positive("mrna_dose", self.mrna_dose)?;
        require_non_negative("mrna_decay_rate", self.mrna_decay_rate)?;
        require_non_negative("delay_to_antibody_response", self.delay_to_antibody_response)?;
        require_non_negative(
            "max_antibody_production_rate",
            self.max_antibody_production_rate,
        )?;
        require_positive("mrna_response_steepness", self.mrna_response_steepness)?;
        require_positive("half_maximal_response_mrna", self.half_maximal_response_mrna)?;
        require_positive("antibody_decay_rate", self.antibody_decay_rate)
    }
}

impl Default for MrnaParams {
    /// Illustrative population values: roughly a ten day production burst
    /// peaking near 1.5e4 and decaying with a two month half-life.
    fn default() -> Self {
        Self {
            mrna_dose: 100.0,
            mrna_decay_rate: 0.3,
            delay_to_antibody_response: 7.0,
            max_antibody_production_rate: 1500.0,
            mrna_response_steepness: 2.0,
            half_maximal_response_mrna: 5.0,
            antibody_decay_rate: 0.0116,
        }
    }
}

/// Parameters of the closed-form boost-and-decay model.
///
/// Each dose adds a smooth rise-then-decay boost whose amplitude shrinks with the
/// titer present at the time of the dose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostDecayParams {
    /// Boost amplitude for a reference dose given to a naive individual.
    pub peak_boost: f64,
    /// Rate at which the boost is realised (per day).
    pub boost_rise_rate: f64,
    /// Exponential decay rate of titer (per day).
    pub decay_rate: f64,
    /// Long-term titer plateau reached after vaccination.
    pub floor_titer: f64,
    /// Pre-dose titer at which the boost amplitude is halved.
    pub boost_saturation: f64,
}

impl BoostDecayParams {
    /// Parameter names in canonical order.
    pub const NAMES: [&'static str; 5] = [
        "peak_boost",
        "boost_rise_rate",
        "decay_rate",
        "floor_titer",
        "boost_saturation",
    ];

    fn values(&self) -> Vec<f64> {
        vec![
            self.peak_boost,
            self.boost_rise_rate,
            self.decay_rate,
            self.floor_titer,
            self.boost_saturation,
        ]
    }

    fn from_values(values: &[f64]) -> Self {
        Self {
            peak_boost: values[0],
            boost_rise_rate: values[1],
            decay_rate: values[2],
            floor_titer: values[3],
            boost_saturation: values[4],
        }
    }

    fn validate(&self) -> Result<(), VaxError> {
        require_non_negative("peak_boost", self.peak_boost)?;
        require_positive("boost_rise_rate", self.boost_rise_rate)?;
        require_positive("decay_rate", self.decay_rate)?;
        require_non_negative("floor_titer", self.floor_titer)?;
        require_positive("boost_saturation", self.boost_saturation)
    }
}

impl Default for BoostDecayParams {
    fn default() -> Self {
        Self {
            peak_boost: 15000.0,
            boost_rise_rate: 0.25,
            decay_rate: 0.0116,
            floor_titer: 50.0,
            boost_saturation: 5000.0,
        }
    }
}

/// Parameters of one individual for one of the supported kinetics models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "kebab-case")]
pub enum ImmuneParameters {
    /// mRNA-driven ODE model.
    Mrna(MrnaParams),
    /// Closed-form boost-and-decay model.
    BoostDecay(BoostDecayParams),
}

impl Default for ImmuneParameters {
    fn default() -> Self {
        ImmuneParameters::Mrna(MrnaParams::default())
    }
}

impl ImmuneParameters {
    /// Parameter names of the active model in canonical order.
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            ImmuneParameters::Mrna(_) => &MrnaParams::NAMES,
            ImmuneParameters::BoostDecay(_) => &BoostDecayParams::NAMES,
        }
    }

    /// Parameter values in canonical order.
    pub fn values(&self) -> Vec<f64> {
        match self {
            ImmuneParameters::Mrna(params) => params.values(),
            ImmuneParameters::BoostDecay(params) => params.values(),
        }
    }

    /// Returns a copy of the same model with replaced values.
    pub fn with_values(&self, values: &[f64]) -> Result<Self, VaxError> {
        if values.len() != self.names().len() {
            return Err(VaxError::Config(
                ErrorInfo::new("parameter-count", "wrong number of kinetics parameters")
                    .with_context("expected", self.names().len())
                    .with_context("actual", values.len()),
            ));
        }
        let updated = match self {
            ImmuneParameters::Mrna(_) => ImmuneParameters::Mrna(MrnaParams::from_values(values)),
            ImmuneParameters::BoostDecay(_) => {
                ImmuneParameters::BoostDecay(BoostDecayParams::from_values(values))
            }
        };
        updated.validate()?;
        Ok(updated)
    }

    /// Builds parameters from `(name, value)` pairs, inferring the model from the names.
    pub fn from_named(pairs: &[(String, f64)]) -> Result<Self, VaxError> {
        let lookup = |names: &[&str]| -> Option<Vec<f64>> {
            if pairs.len() != names.len() {
                return None;
            }
            names
                .iter()
                .map(|name| {
                    pairs
                        .iter()
                        .find(|(candidate, _)| candidate == name)
                        .map(|(_, value)| *value)
                })
                .collect()
        };
        let params = if let Some(values) = lookup(&MrnaParams::NAMES) {
            ImmuneParameters::Mrna(MrnaParams::from_values(&values))
        } else if let Some(values) = lookup(&BoostDecayParams::NAMES) {
            ImmuneParameters::BoostDecay(BoostDecayParams::from_values(&values))
        } else {
            let names: Vec<&str> = pairs.iter().map(|(name, _)| name.as_str()).collect();
            return Err(VaxError::Config(
                ErrorInfo::new(
                    "unknown-parameter-set",
                    "parameter names match no kinetics model",
                )
                .with_context("names", names.join(","))
                .with_hint("supply either the seven mRNA model parameters or the five boost-decay parameters"),
            ));
        };
        params.validate()?;
        Ok(params)
    }

    /// Validates every parameter of the active model.
    pub fn validate(&self) -> Result<(), VaxError> {
        match self {
            ImmuneParameters::Mrna(params) => params.validate(),
            ImmuneParameters::BoostDecay(params) => params.validate(),
        }
    }

    /// Natural decay rate applied to pre-existing titer.
    pub fn natural_decay_rate(&self) -> f64 {
        match self {
            ImmuneParameters::Mrna(params) => params.antibody_decay_rate,
            ImmuneParameters::BoostDecay(params) => params.decay_rate,
        }
    }
}
