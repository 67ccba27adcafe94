#![deny(missing_docs)]
#![doc = "Sensitivity sweeps over model inputs and canned outbreak-risk analyses."]

/// Vaccination, methods-comparison, simulation and within-host tables.
pub mod analyses;
/// Parallel sweep execution with shared vaccinated profiles.
pub mod harness;
/// Sweep axes and labelled scenarios.
pub mod scenario;

pub use analyses::{
    dispersion_label, methods_comparison, month_starts, simulation_examples, vaccination_example,
    within_host_example, MethodsComparison, MethodsComparisonConfig, SimulationExamplesConfig,
    BRANCHING_COLUMNS, VACCINATION_EXAMPLE_COLUMNS,
};
pub use harness::{
    expand_scenarios, run_scenario, run_sweep, ProfileCache, ScenarioResult, SweepPlan, SweepReport,
};
pub use scenario::{objective_family, reference_axes, Scenario, ScenarioLabel, SweepAxis};
