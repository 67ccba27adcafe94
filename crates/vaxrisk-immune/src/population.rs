//! Population distribution of individual kinetics parameters.
//!
//! Individual parameters are log-normal around the population values:
//! `log θᵢ = log θ_pop + L z` with `z ~ N(0, I)`. `L` is diagonal for independent
//! random effects or the Cholesky factor of a supplied covariance matrix.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::{require_non_negative, RngHandle};

use crate::params::ImmuneParameters;

fn population_error(code: &str, message: impl Into<String>) -> VaxError {
    VaxError::Config(ErrorInfo::new(code, message))
}

/// One named row of a population parameter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRow {
    /// Parameter name, e.g. `antibody_decay_rate`.
    pub parameter: String,
    /// Population (fixed-effect) value.
    pub population_value: f64,
    /// Standard deviation of the log-scale random effect.
    #[serde(default)]
    pub random_effect: f64,
}

/// Random-effect structure on the log scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RandomEffects {
    /// Independent effects with one standard deviation per parameter.
    Independent {
        /// Standard deviations in canonical parameter order.
        standard_deviations: Vec<f64>,
    },
    /// Correlated effects given by a full covariance matrix (row-major rows).
    Covariance {
        /// Symmetric positive-definite covariance in canonical parameter order.
        matrix: Vec<Vec<f64>>,
    },
}

/// Population-level kinetics parameters and their random effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationImmunity {
    /// Population parameter values.
    pub population: ImmuneParameters,
    /// Log-scale random effects.
    pub random_effects: RandomEffects,
}

impl Default for PopulationImmunity {
    fn default() -> Self {
        Self {
            population: ImmuneParameters::default(),
            random_effects: RandomEffects::Independent {
                standard_deviations: vec![0.3, 0.3, 0.2, 0.3, 0.3, 0.3, 0.3],
            },
        }
    }
}

impl PopulationImmunity {
    /// Population without individual variation.
    pub fn homogeneous(population: ImmuneParameters) -> Self {
        let count = population.names().len();
        Self {
            population,
            random_effects: RandomEffects::Independent {
                standard_deviations: vec![0.0; count],
            },
        }
    }

    /// Builds the population from a named parameter table with independent effects.
    pub fn from_rows(rows: &[ParameterRow]) -> Result<Self, VaxError> {
        let pairs: Vec<(String, f64)> = rows
            .iter()
            .map(|row| (row.parameter.clone(), row.population_value))
            .collect();
        let population = ImmuneParameters::from_named(&pairs)?;
        let standard_deviations = population
            .names()
            .iter()
            .map(|name| {
                rows.iter()
                    .find(|row| row.parameter == *name)
                    .map(|row| row.random_effect)
                    .unwrap_or(0.0)
            })
            .collect();
        let immunity = Self {
            population,
            random_effects: RandomEffects::Independent {
                standard_deviations,
            },
        };
        immunity.validate()?;
        Ok(immunity)
    }

    /// Validates the population values and the random-effect structure.
    pub fn validate(&self) -> Result<(), VaxError> {
        self.sampler().map(|_| ())
    }

    /// Prepares a sampler, factorising the covariance once.
    pub fn sampler(&self) -> Result<PopulationSampler, VaxError> {
        self.population.validate()?;
        let dim = self.population.names().len();
        let factor = match &self.random_effects {
            RandomEffects::Independent {
                standard_deviations,
            } => {
                if standard_deviations.len() != dim {
                    return Err(VaxError::Config(
                        ErrorInfo::new(
                            "random-effect-count",
                            "one random-effect standard deviation is required per parameter",
                        )
                        .with_context("expected", dim)
                        .with_context("actual", standard_deviations.len()),
                    ));
                }
                for (name, &sd) in self.population.names().iter().zip(standard_deviations) {
                    require_non_negative(name, sd)?;
                }
                DMatrix::from_diagonal(&DVector::from_column_slice(standard_deviations))
            }
            RandomEffects::Covariance { matrix } => cholesky_factor(matrix, dim)?,
        };
        Ok(PopulationSampler {
            log_population: self.population.values().iter().map(|v| v.ln()).collect(),
            population: self.population.clone(),
            factor,
        })
    }
}

fn cholesky_factor(matrix: &[Vec<f64>], dim: usize) -> Result<DMatrix<f64>, VaxError> {
    if matrix.len() != dim || matrix.iter().any(|row| row.len() != dim) {
        return Err(VaxError::Config(
            ErrorInfo::new("covariance-shape", "covariance matrix must be square")
                .with_context("expected", dim),
        ));
    }
    let covariance = DMatrix::from_fn(dim, dim, |i, j| matrix[i][j]);
    if covariance.iter().any(|value| !value.is_finite()) {
        return Err(population_error(
            "covariance-finite",
            "covariance entries must be finite",
        ));
    }
    if (&covariance - covariance.transpose()).amax() > 1e-12 {
        return Err(population_error(
            "covariance-symmetry",
            "covariance matrix must be symmetric",
        ));
    }
    covariance
        .cholesky()
        .map(|cholesky| cholesky.l())
        .ok_or_else(|| {
            VaxError::Config(
                ErrorInfo::new(
                    "covariance-definite",
                    "covariance matrix is not positive definite",
                )
                .with_hint("use independent random effects when some variances are zero"),
            )
        })
}

/// Draws individual parameter sets from a validated population.
#[derive(Debug, Clone)]
pub struct PopulationSampler {
    population: ImmuneParameters,
    log_population: Vec<f64>,
    factor: DMatrix<f64>,
}

impl PopulationSampler {
    /// Draws one individual.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ImmuneParameters, VaxError> {
        let dim = self.log_population.len();
        let z = DVector::from_fn(dim, |_, _| rng.sample::<f64, _>(StandardNormal));
        let effects = &self.factor * z;
        let values: Vec<f64> = self
            .log_population
            .iter()
            .zip(effects.iter())
            .map(|(log_value, effect)| (log_value + effect).exp())
            .collect();
        self.population.with_values(&values)
    }

    /// Draws individual `index` from its own substream of `seed`.
    pub fn draw_individual(&self, seed: u64, index: u64) -> Result<ImmuneParameters, VaxError> {
        let mut rng = RngHandle::substream(seed, index);
        self.draw(&mut rng)
    }

    /// Draws `count` individuals, individual `i` using substream `i` of `seed`.
    pub fn sample(&self, seed: u64, count: usize) -> Result<Vec<ImmuneParameters>, VaxError> {
        (0..count as u64)
            .map(|index| self.draw_individual(seed, index))
            .collect()
    }
}
