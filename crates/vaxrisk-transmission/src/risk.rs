//! Instantaneous outbreak risk from the branching-process extinction equation.

use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::require_positive;

use crate::offspring::Dispersion;

fn default_tolerance() -> f64 {
    1e-10
}

fn default_max_bisection_iterations() -> u32 {
    200
}

fn default_max_fixed_point_iterations() -> u32 {
    100_000
}

/// Tolerances and iteration caps of the outbreak-risk solvers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Absolute tolerance on the outbreak risk.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Iteration cap of the scalar bisection.
    #[serde(default = "default_max_bisection_iterations")]
    pub max_bisection_iterations: u32,
    /// Iteration cap of the coupled fixed-point iteration.
    #[serde(default = "default_max_fixed_point_iterations")]
    pub max_fixed_point_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_bisection_iterations: default_max_bisection_iterations(),
            max_fixed_point_iterations: default_max_fixed_point_iterations(),
        }
    }
}

impl SolverConfig {
    /// Rejects a non-positive tolerance or zero caps.
    pub fn validate(&self) -> Result<(), VaxError> {
        require_positive("solver_tolerance", self.tolerance)?;
        if self.max_bisection_iterations == 0 || self.max_fixed_point_iterations == 0 {
            return Err(VaxError::Config(ErrorInfo::new(
                "solver-iterations",
                "iteration caps must be positive",
            )));
        }
        Ok(())
    }
}

/// Probability that one case introduced when the reproduction number is `r`
/// causes a large outbreak.
///
/// Solves `q = 1 − G(1 − q)` for the largest root in `[0, 1]` by bisection.
/// Sub-critical and critical values (`r <= 1`) return exactly zero.
pub fn instantaneous_outbreak_risk(
    r: f64,
    dispersion: &Dispersion,
    solver: &SolverConfig,
) -> Result<f64, VaxError> {
    assert!(
        r.is_finite() && r >= 0.0,
        "reproduction number must be finite and non-negative, got {r}"
    );
    if r <= 1.0 {
        return Ok(0.0);
    }
    // f(q) = escape(r q) − q is positive below the root and negative above it.
    let excess = |q: f64| dispersion.escape_probability(r * q) - q;
    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    for _ in 0..solver.max_bisection_iterations {
        if hi - lo <= solver.tolerance {
            return Ok(0.5 * (lo + hi));
        }
        let mid = 0.5 * (lo + hi);
        if excess(mid) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    if hi - lo <= solver.tolerance {
        return Ok(0.5 * (lo + hi));
    }
    Err(VaxError::Convergence(
        ErrorInfo::new(
            "bisection-cap",
            "outbreak risk bisection did not reach the tolerance",
        )
        .with_context("reproduction_number", r)
        .with_context("bracket_width", hi - lo)
        .with_context("iterations", solver.max_bisection_iterations)
        .with_hint("raise max_bisection_iterations or relax the tolerance"),
    ))
}

/// Instantaneous outbreak risk for each reproduction number of a slice.
pub fn instantaneous_outbreak_risks(
    reproduction_numbers: &[f64],
    dispersion: &Dispersion,
    solver: &SolverConfig,
) -> Result<Vec<f64>, VaxError> {
    reproduction_numbers
        .iter()
        .map(|&r| instantaneous_outbreak_risk(r, dispersion, solver))
        .collect()
}
