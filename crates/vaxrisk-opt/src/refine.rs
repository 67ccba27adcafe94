//! Local refinement seeded from the grid optimum.

use std::sync::atomic::{AtomicUsize, Ordering};

use argmin::core::{CostFunction, Executor};
use argmin::solver::brent::BrentOpt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::require_positive;

use crate::grid::{cartesian_product, checked_objective, evaluate_points, GridResult, SearchSpace};

fn default_resolution() -> f64 {
    1.0
}

fn default_min_step() -> f64 {
    0.25
}

fn default_max_evaluations() -> usize {
    500
}

fn default_max_iterations() -> u64 {
    100
}

fn refine_error(code: &str, message: impl Into<String>) -> VaxError {
    VaxError::Optimization(ErrorInfo::new(code, message))
}

/// How the grid optimum is polished.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Refinement {
    /// Report the grid optimum unchanged.
    None,
    /// Re-grid `± step` around the optimum at a finer resolution.
    LocalGrid {
        /// Spacing of the local grid.
        #[serde(default = "default_resolution")]
        resolution: f64,
    },
    /// Compass search starting with half the grid step, halving on failure.
    PatternSearch {
        /// Search stops once every step is below this value.
        #[serde(default = "default_min_step")]
        min_step: f64,
        /// Objective evaluation budget.
        #[serde(default = "default_max_evaluations")]
        max_evaluations: usize,
    },
    /// Bounded Brent minimisation within `± step`; one-dimensional spaces only.
    Brent {
        /// Iteration cap of the solver.
        #[serde(default = "default_max_iterations")]
        max_iterations: u64,
    },
}

impl Default for Refinement {
    fn default() -> Self {
        Refinement::LocalGrid {
            resolution: default_resolution(),
        }
    }
}

impl Refinement {
    /// Resolutions and step floors must be positive, budgets non-zero.
    pub fn validate(&self) -> Result<(), VaxError> {
        match self {
            Refinement::None => Ok(()),
            Refinement::LocalGrid { resolution } => require_positive("resolution", *resolution),
            Refinement::PatternSearch {
                min_step,
                max_evaluations,
            } => {
                require_positive("min_step", *min_step)?;
                if *max_evaluations == 0 {
                    return Err(VaxError::Config(ErrorInfo::new(
                        "max-evaluations",
                        "pattern search needs a positive evaluation budget",
                    )));
                }
                Ok(())
            }
            Refinement::Brent { max_iterations } => {
                if *max_iterations == 0 {
                    return Err(VaxError::Config(ErrorInfo::new(
                        "max-iterations",
                        "Brent refinement needs a positive iteration cap",
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Refined optimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimum {
    /// Coordinates in axis order.
    pub point: Vec<f64>,
    /// Objective at `point`.
    pub objective_value: f64,
    /// Objective evaluations spent in refinement.
    pub evaluations: usize,
}

/// Refines the best point of `grid`; the result is never worse than the grid optimum.
pub fn refine<F>(
    space: &SearchSpace,
    grid: &GridResult,
    refinement: &Refinement,
    objective: &F,
) -> Result<Optimum, VaxError>
where
    F: Fn(&[f64]) -> Result<f64, VaxError> + Sync,
{
    refinement.validate()?;
    let start = grid.best();
    let candidate = match refinement {
        Refinement::None => Optimum {
            point: start.point.clone(),
            objective_value: start.objective_value,
            evaluations: 0,
        },
        Refinement::LocalGrid { resolution } => local_grid(space, &start.point, *resolution, objective)?,
        Refinement::PatternSearch {
            min_step,
            max_evaluations,
        } => pattern_search(
            space,
            &start.point,
            start.objective_value,
            *min_step,
            *max_evaluations,
            objective,
        )?,
        Refinement::Brent { max_iterations } => brent(space, &start.point, *max_iterations, objective)?,
    };
    if candidate.objective_value <= start.objective_value {
        debug!(
            point = ?candidate.point,
            value = candidate.objective_value,
            evaluations = candidate.evaluations,
            "refinement accepted"
        );
        Ok(candidate)
    } else {
        Ok(Optimum {
            point: start.point.clone(),
            objective_value: start.objective_value,
            evaluations: candidate.evaluations,
        })
    }
}

fn local_grid<F>(
    space: &SearchSpace,
    centre: &[f64],
    resolution: f64,
    objective: &F,
) -> Result<Optimum, VaxError>
where
    F: Fn(&[f64]) -> Result<f64, VaxError> + Sync,
{
    let values: Vec<Vec<f64>> = space
        .axes()
        .iter()
        .zip(centre)
        .map(|(axis, &value)| axis.values_around(value, axis.step, resolution))
        .collect();
    let points = cartesian_product(&values);
    info!(points = points.len(), "refining on a local grid");
    let evaluations = points.len();
    let local = evaluate_points(space.names(), points, objective)?;
    let best = local.best();
    Ok(Optimum {
        point: best.point.clone(),
        objective_value: best.objective_value,
        evaluations,
    })
}

fn pattern_search<F>(
    space: &SearchSpace,
    start: &[f64],
    start_value: f64,
    min_step: f64,
    max_evaluations: usize,
    objective: &F,
) -> Result<Optimum, VaxError>
where
    F: Fn(&[f64]) -> Result<f64, VaxError>,
{
    let mut current = start.to_vec();
    let mut current_value = start_value;
    let mut steps: Vec<f64> = space.axes().iter().map(|axis| axis.step / 2.0).collect();
    let mut evaluations = 0;
    'search: while steps.iter().any(|&step| step >= min_step) {
        let mut improved = false;
        for (idx, axis) in space.axes().iter().enumerate() {
            if steps[idx] < min_step {
                continue;
            }
            for direction in [-1.0, 1.0] {
                let moved = axis.clamp(current[idx] + direction * steps[idx]);
                if moved == current[idx] {
                    continue;
                }
                if evaluations == max_evaluations {
                    break 'search;
                }
                let mut candidate = current.clone();
                candidate[idx] = moved;
                let value = checked_objective(objective, &candidate)?;
                evaluations += 1;
                if value < current_value {
                    current = candidate;
                    current_value = value;
                    improved = true;
                    break;
                }
            }
        }
        if !improved {
            steps.iter_mut().for_each(|step| *step /= 2.0);
        }
    }
    Ok(Optimum {
        point: current,
        objective_value: current_value,
        evaluations,
    })
}

struct ScalarProblem<'a, F> {
    objective: &'a F,
    calls: &'a AtomicUsize,
}

impl<F> CostFunction for ScalarProblem<'_, F>
where
    F: Fn(&[f64]) -> Result<f64, VaxError>,
{
    type Param = f64;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(checked_objective(self.objective, &[*param])?)
    }
}

fn brent<F>(
    space: &SearchSpace,
    start: &[f64],
    max_iterations: u64,
    objective: &F,
) -> Result<Optimum, VaxError>
where
    F: Fn(&[f64]) -> Result<f64, VaxError>,
{
    let [axis] = space.axes() else {
        return Err(VaxError::Config(
            ErrorInfo::new("brent-dimension", "Brent refinement requires exactly one axis")
                .with_context("dimension", space.dimension()),
        ));
    };
    let lower = axis.clamp(start[0] - axis.step);
    let upper = axis.clamp(start[0] + axis.step);
    if upper <= lower {
        return Err(refine_error("brent-interval", "refinement interval is empty"));
    }
    let calls = AtomicUsize::new(0);
    let problem = ScalarProblem {
        objective,
        calls: &calls,
    };
    let result = Executor::new(problem, BrentOpt::new(lower, upper))
        .configure(|state| state.max_iters(max_iterations))
        .run()
        .map_err(|err| match err.downcast::<VaxError>() {
            Ok(inner) => inner,
            Err(other) => refine_error("brent-failed", other.to_string()),
        })?;
    let state = result.state();
    let point = state
        .best_param
        .ok_or_else(|| refine_error("brent-no-point", "Brent solver returned no point"))?;
    Ok(Optimum {
        point: vec![point],
        objective_value: state.best_cost,
        evaluations: calls.load(Ordering::Relaxed),
    })
}
