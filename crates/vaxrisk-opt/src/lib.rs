#![deny(missing_docs)]
#![doc = "Grid search with local refinement, applied to vaccination-timing problems."]

/// Rectangular search spaces and parallel grid evaluation.
pub mod grid;
/// Refinement strategies seeded from the grid optimum.
pub mod refine;
/// Grid search followed by refinement.
pub mod search;
/// Campaign-window and boost-schedule problems.
pub mod timing;

pub use grid::{
    evaluate_points, grid_search, GridPoint, GridResult, SearchAxis, SearchSpace, OBJECTIVE_COLUMN,
};
pub use refine::{refine, Optimum, Refinement};
pub use search::{optimize, SearchOutcome};
pub use timing::{
    optimize_timing, BoostScheduleProblem, CampaignTimingProblem, OptimizationResult,
    OptimizerConfig, TimingProblem, CAMPAIGN_AXES,
};
