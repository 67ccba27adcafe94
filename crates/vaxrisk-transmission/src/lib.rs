#![deny(missing_docs)]
#![doc = "Seasonal transmission, branching-process outbreak risk and renewal simulation for vaxrisk."]

/// Branching-process Monte Carlo.
pub mod branching;
/// Periodic case outbreak risk.
pub mod case_risk;
/// Model configuration.
pub mod config;
/// Discrete generation-time distributions.
pub mod generation;
/// Outbreak-risk model facade.
pub mod model;
/// Scalar objectives over risk trajectories.
pub mod objective;
/// Offspring distributions.
pub mod offspring;
/// Renewal-equation simulation.
pub mod renewal;
/// Seasonal reproduction number.
pub mod reproduction;
/// Instantaneous outbreak risk.
pub mod risk;

pub use branching::{
    branching_outbreak_risk, simulate_trial, BranchingConfig, Introduction, MonteCarloEstimate,
    TrialStatus,
};
pub use case_risk::case_outbreak_risk;
pub use config::ModelConfig;
pub use generation::{GenerationTime, GenerationTimeConfig, MAX_TRUNCATED_MASS};
pub use model::{
    campaign_susceptibility, vaccinated_profile, OutbreakRiskModel, RiskTrajectory, TRAJECTORY_COLUMNS,
};
pub use objective::{december_january, DayWindow, ObjectiveConfig, ObjectiveFunction, RiskMeasure};
pub use offspring::{sample_poisson, Dispersion};
pub use renewal::{RenewalSimulator, SimulationConfig, SimulationOutcome};
pub use reproduction::{IndividualReproduction, SeasonalReproduction};
pub use risk::{instantaneous_outbreak_risk, instantaneous_outbreak_risks, SolverConfig};
