//! Case outbreak risk on a periodic day grid.
//!
//! A case infected on day `i` infects on day `i + d` with weight `w_d R_{i+d}`;
//! each of those infectees starts an outbreak with probability `r_{i+d}`. The
//! risks therefore satisfy the coupled system
//! `r_i = 1 − G(1 − Σ_d w_d R_{(i+d) mod P} r_{(i+d) mod P})`.

use tracing::debug;
use vaxrisk_core::errors::{ErrorInfo, VaxError};

use crate::generation::GenerationTime;
use crate::offspring::Dispersion;
use crate::risk::SolverConfig;

/// Solves the periodic case outbreak risk for daily reproduction numbers.
///
/// Iterates `r ← F(r)` from `r ≡ 1`. `F` is monotone, so the iterates decrease to
/// the largest fixed point. The contraction rate `ρ` is estimated from successive
/// step sizes and the iteration stops once the remaining error `step · ρ / (1 − ρ)`
/// is within the tolerance. Iterates decaying geometrically to zero give exactly
/// zero, as does a year without a supercritical day.
pub fn case_outbreak_risk(
    reproduction_numbers: &[f64],
    generation_time: &GenerationTime,
    dispersion: &Dispersion,
    solver: &SolverConfig,
) -> Result<Vec<f64>, VaxError> {
    let period = reproduction_numbers.len();
    let support = generation_time.max_days();
    if support >= period {
        return Err(VaxError::Config(
            ErrorInfo::new(
                "generation-time-support",
                "maximum generation time must be shorter than the period",
            )
            .with_context("max_generation_time", support)
            .with_context("period", period),
        ));
    }
    for &r in reproduction_numbers {
        assert!(
            r.is_finite() && r >= 0.0,
            "reproduction number must be finite and non-negative, got {r}"
        );
    }
    if reproduction_numbers.iter().all(|&r| r <= 1.0) {
        return Ok(vec![0.0; period]);
    }

    let weights = generation_time.pmf();
    let mut risk = vec![1.0; period];
    let mut next = vec![0.0; period];
    let mut previous_ratio = f64::NAN;
    let mut previous_change = f64::NAN;
    for iteration in 0..solver.max_fixed_point_iterations {
        let mut change = 0.0_f64;
        for day in 0..period {
            let pressure: f64 = weights
                .iter()
                .enumerate()
                .map(|(offset, w)| {
                    let target = (day + offset + 1) % period;
                    w * reproduction_numbers[target] * risk[target]
                })
                .sum();
            let value = dispersion.escape_probability(pressure);
            change = change.max((value - risk[day]).abs());
            next[day] = value;
        }
        if change == 0.0 {
            debug!(iterations = iteration + 1, "case outbreak risk reached a fixed point");
            return Ok(next);
        }
        let ratio = change / previous_change;
        // The larger of the last two step ratios estimates the rate.
        let rate = ratio.max(previous_ratio);
        previous_ratio = ratio;
        previous_change = change;
        if rate < 1.0 && change * rate / (1.0 - rate) <= solver.tolerance {
            let extrapolation = rate / (1.0 - rate);
            let vanishing = risk
                .iter()
                .zip(&next)
                .all(|(old, new)| new - (old - new) * extrapolation <= solver.tolerance);
            debug!(
                iterations = iteration + 1,
                contraction = rate,
                vanishing,
                "case outbreak risk converged"
            );
            return Ok(if vanishing { vec![0.0; period] } else { next });
        }
        std::mem::swap(&mut risk, &mut next);
    }
    Err(VaxError::Convergence(
        ErrorInfo::new(
            "fixed-point-cap",
            "case outbreak risk iteration did not reach the tolerance",
        )
        .with_context("iterations", solver.max_fixed_point_iterations)
        .with_context(
            "max_reproduction_number",
            reproduction_numbers.iter().cloned().fold(0.0, f64::max),
        )
        .with_hint("the system may be close to critical; raise max_fixed_point_iterations"),
    ))
}
