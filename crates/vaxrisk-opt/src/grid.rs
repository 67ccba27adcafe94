//! Exhaustive evaluation of an objective over a rectangular grid.

use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::{require_positive, ResultTable};

/// Column holding the objective in grid tables.
pub const OBJECTIVE_COLUMN: &str = "objective_value";

const BOUND_SLACK: f64 = 1e-9;

fn grid_error(code: &str, message: impl Into<String>) -> VaxError {
    VaxError::Config(ErrorInfo::new(code, message))
}

fn optimization_error(code: &str, message: impl Into<String>) -> VaxError {
    VaxError::Optimization(ErrorInfo::new(code, message))
}

/// One searched dimension with its admissible bounds and grid spacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchAxis {
    /// Column name in result tables.
    pub name: String,
    /// Smallest admissible value.
    pub lower: f64,
    /// Largest admissible value.
    pub upper: f64,
    /// Coarse grid spacing.
    pub step: f64,
    /// First coarse grid value when it differs from `lower`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_origin: Option<f64>,
}

impl SearchAxis {
    /// Axis over `[lower, upper]` with grid values `lower, lower + step, …`.
    pub fn new(name: impl Into<String>, lower: f64, upper: f64, step: f64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            step,
            grid_origin: None,
        }
    }

    /// Starts the coarse grid at `origin` while keeping `lower` admissible for refinement.
    pub fn with_grid_origin(mut self, origin: f64) -> Self {
        self.grid_origin = Some(origin);
        self
    }

    /// Bounds must be finite and ordered, the step positive, the origin inside the bounds.
    pub fn validate(&self) -> Result<(), VaxError> {
        if !(self.lower.is_finite() && self.upper.is_finite()) || self.lower > self.upper {
            return Err(VaxError::Config(
                ErrorInfo::new("axis-bounds", "axis bounds must be finite with lower <= upper")
                    .with_context("axis", &self.name)
                    .with_context("lower", self.lower)
                    .with_context("upper", self.upper),
            ));
        }
        require_positive("grid_step", self.step).map_err(|err| {
            VaxError::Config(err.info().clone().with_context("axis", &self.name))
        })?;
        let origin = self.origin();
        if !(origin >= self.lower && origin <= self.upper) {
            return Err(VaxError::Config(
                ErrorInfo::new("axis-origin", "grid origin must lie within the axis bounds")
                    .with_context("axis", &self.name)
                    .with_context("origin", origin),
            ));
        }
        Ok(())
    }

    fn origin(&self) -> f64 {
        self.grid_origin.unwrap_or(self.lower)
    }

    /// Coarse grid values `origin + i · step` not exceeding `upper`.
    pub fn grid_values(&self) -> Vec<f64> {
        let origin = self.origin();
        let count = ((self.upper - origin) / self.step + BOUND_SLACK).floor() as usize + 1;
        (0..count)
            .map(|idx| origin + idx as f64 * self.step)
            .collect()
    }

    /// Values `centre + i · resolution` with `|i · resolution| <= radius`, kept within bounds.
    pub fn values_around(&self, centre: f64, radius: f64, resolution: f64) -> Vec<f64> {
        let reach = (radius / resolution + BOUND_SLACK).floor() as i64;
        (-reach..=reach)
            .map(|offset| centre + offset as f64 * resolution)
            .filter(|value| self.contains(*value))
            .collect()
    }

    /// Whether `value` lies within the admissible bounds.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower - BOUND_SLACK && value <= self.upper + BOUND_SLACK
    }

    /// Nearest admissible value.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }
}

/// Ordered set of axes; the first axis varies slowest in grid order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    axes: Vec<SearchAxis>,
}

impl SearchSpace {
    /// Validates every axis and rejects empty spaces or duplicate names.
    pub fn new(axes: Vec<SearchAxis>) -> Result<Self, VaxError> {
        if axes.is_empty() {
            return Err(grid_error("space-empty", "search space needs at least one axis"));
        }
        let mut seen = BTreeSet::new();
        for axis in &axes {
            axis.validate()?;
            if !seen.insert(axis.name.as_str()) {
                return Err(VaxError::Config(
                    ErrorInfo::new("axis-duplicate", "axis names must be unique")
                        .with_context("axis", &axis.name),
                ));
            }
        }
        Ok(Self { axes })
    }

    /// Axes in grid order.
    pub fn axes(&self) -> &[SearchAxis] {
        &self.axes
    }

    /// Number of axes.
    pub fn dimension(&self) -> usize {
        self.axes.len()
    }

    /// Axis names in grid order.
    pub fn names(&self) -> Vec<String> {
        self.axes.iter().map(|axis| axis.name.clone()).collect()
    }

    /// Every coarse grid point in row-major order.
    pub fn grid_points(&self) -> Vec<Vec<f64>> {
        let values: Vec<Vec<f64>> = self.axes.iter().map(SearchAxis::grid_values).collect();
        cartesian_product(&values)
    }
}

/// Row-major cartesian product of per-axis values.
pub(crate) fn cartesian_product(values: &[Vec<f64>]) -> Vec<Vec<f64>> {
    values.iter().fold(vec![Vec::new()], |points, axis_values| {
        points
            .iter()
            .flat_map(|prefix| {
                axis_values.iter().map(move |&value| {
                    let mut point = prefix.clone();
                    point.push(value);
                    point
                })
            })
            .collect()
    })
}

/// Objective value at one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// Coordinates in axis order.
    pub point: Vec<f64>,
    /// Objective value; `+∞` marks an infeasible point.
    pub objective_value: f64,
}

/// Every evaluated point together with the index of the best one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridResult {
    /// Axis names in point order.
    pub axes: Vec<String>,
    /// Evaluations in grid order.
    pub evaluations: Vec<GridPoint>,
    /// Index of the lowest objective; the earliest index wins ties.
    pub best_index: usize,
}

impl GridResult {
    /// Best evaluated point.
    pub fn best(&self) -> &GridPoint {
        &self.evaluations[self.best_index]
    }

    /// One row per point: the axis columns followed by [`OBJECTIVE_COLUMN`].
    pub fn to_table(&self) -> Result<ResultTable, VaxError> {
        let mut columns = self.axes.clone();
        columns.push(OBJECTIVE_COLUMN.to_string());
        let mut table = ResultTable::new(columns)?;
        for evaluation in &self.evaluations {
            let mut row = evaluation.point.clone();
            row.push(evaluation.objective_value);
            table.push_row(row)?;
        }
        Ok(table)
    }
}

/// Evaluates `objective` at each point in parallel and picks the lowest value.
///
/// NaN values are errors. At least one point must be finite.
pub fn evaluate_points<F>(
    axes: Vec<String>,
    points: Vec<Vec<f64>>,
    objective: &F,
) -> Result<GridResult, VaxError>
where
    F: Fn(&[f64]) -> Result<f64, VaxError> + Sync,
{
    if points.is_empty() {
        return Err(optimization_error("grid-empty", "no points to evaluate"));
    }
    let values: Vec<f64> = points
        .par_iter()
        .map(|point| checked_objective(objective, point))
        .collect::<Result<_, _>>()?;
    let mut best_index = 0;
    for (idx, &value) in values.iter().enumerate() {
        if value < values[best_index] {
            best_index = idx;
        }
    }
    if values[best_index] == f64::INFINITY {
        return Err(optimization_error(
            "grid-infeasible",
            "every grid point is infeasible",
        ));
    }
    let evaluations: Vec<GridPoint> = points
        .into_iter()
        .zip(values)
        .map(|(point, objective_value)| GridPoint {
            point,
            objective_value,
        })
        .collect();
    debug!(
        points = evaluations.len(),
        best = ?evaluations[best_index].point,
        value = evaluations[best_index].objective_value,
        "grid evaluated"
    );
    Ok(GridResult {
        axes,
        evaluations,
        best_index,
    })
}

/// Evaluates `objective` over the coarse grid of `space`.
pub fn grid_search<F>(space: &SearchSpace, objective: &F) -> Result<GridResult, VaxError>
where
    F: Fn(&[f64]) -> Result<f64, VaxError> + Sync,
{
    let points = space.grid_points();
    info!(
        axes = ?space.names(),
        points = points.len(),
        "running grid search"
    );
    evaluate_points(space.names(), points, objective)
}

pub(crate) fn checked_objective<F>(objective: &F, point: &[f64]) -> Result<f64, VaxError>
where
    F: Fn(&[f64]) -> Result<f64, VaxError>,
{
    let value = objective(point)?;
    if value.is_nan() {
        return Err(VaxError::Optimization(
            ErrorInfo::new("objective-nan", "objective returned NaN")
                .with_context("point", format!("{point:?}")),
        ));
    }
    Ok(value)
}
