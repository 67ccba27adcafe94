//! Grid search followed by refinement, shared by every timing problem.

use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::VaxError;

use crate::grid::{grid_search, GridPoint, GridResult, SearchSpace};
use crate::refine::{refine, Optimum, Refinement};

/// Full grid plus the refined optimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Every coarse grid evaluation.
    pub grid: GridResult,
    /// Refined optimum, never worse than the grid optimum.
    pub best: Optimum,
}

impl SearchOutcome {
    /// Best coarse grid point.
    pub fn grid_best(&self) -> &GridPoint {
        self.grid.best()
    }
}

/// Minimises `objective` over `space`.
pub fn optimize<F>(
    space: &SearchSpace,
    refinement: &Refinement,
    objective: &F,
) -> Result<SearchOutcome, VaxError>
where
    F: Fn(&[f64]) -> Result<f64, VaxError> + Sync,
{
    refinement.validate()?;
    let grid = grid_search(space, objective)?;
    let best = refine(space, &grid, refinement, objective)?;
    Ok(SearchOutcome { grid, best })
}
