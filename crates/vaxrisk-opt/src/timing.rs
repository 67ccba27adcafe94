//! Vaccination-timing problems: campaign windows and per-individual boost schedules.

use serde::{Deserialize, Serialize};
use tracing::info;
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::{require_positive, ResultTable, RunProvenance};
use vaxrisk_immune::{PeriodicSchedule, VaccinatedProfile, VaccinationCampaign};
use vaxrisk_transmission::{
    campaign_susceptibility, GenerationTime, ModelConfig, OutbreakRiskModel, RiskTrajectory,
};

use crate::grid::{GridPoint, GridResult, SearchAxis, SearchSpace};
use crate::refine::{Optimum, Refinement};
use crate::search::optimize;

/// Axis names of the campaign-window problem.
pub const CAMPAIGN_AXES: [&str; 2] = ["vaccination_start", "vaccination_duration"];

fn default_grid_step() -> f64 {
    10.0
}

/// Grid spacing and refinement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Coarse grid spacing in days.
    #[serde(default = "default_grid_step")]
    pub grid_step: f64,
    /// Refinement applied to the grid optimum.
    #[serde(default)]
    pub refinement: Refinement,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            grid_step: default_grid_step(),
            refinement: Refinement::default(),
        }
    }
}

impl OptimizerConfig {
    /// Rejects a non-positive grid step or invalid refinement settings.
    pub fn validate(&self) -> Result<(), VaxError> {
        require_positive("grid_step", self.grid_step)?;
        self.refinement.validate()
    }
}

/// A vaccination-timing parametrisation the optimiser can search.
pub trait TimingProblem: Sync {
    /// Model configuration shared by every evaluation.
    fn config(&self) -> &ModelConfig;

    /// Search space for the given grid step.
    fn search_space(&self, grid_step: f64) -> Result<SearchSpace, VaxError>;

    /// Model for the timing at `point`, or `None` if the timing is infeasible.
    fn model(&self, point: &[f64]) -> Result<Option<OutbreakRiskModel>, VaxError>;

    /// Objective of the configuration at `point`; infeasible timings score `+∞`.
    fn objective(&self, point: &[f64]) -> Result<f64, VaxError> {
        match self.model(point)? {
            Some(model) => model.objective_value(&self.config().objective),
            None => Ok(f64::INFINITY),
        }
    }
}

/// Grid, grid optimum, refined optimum and the trajectory at the refined optimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Configuration hash and seed of the run.
    pub provenance: RunProvenance,
    /// Every coarse grid evaluation.
    pub grid: GridResult,
    /// Best coarse grid point.
    pub grid_best: GridPoint,
    /// Refined optimum.
    pub best: Optimum,
    /// Risk trajectory over one period at the refined optimum.
    pub best_trajectory: RiskTrajectory,
}

impl OptimizationResult {
    /// Grid table with the axis columns and `objective_value`.
    pub fn grid_table(&self) -> Result<ResultTable, VaxError> {
        self.grid.to_table()
    }

    /// One-row table of the refined optimum.
    pub fn best_table(&self) -> Result<ResultTable, VaxError> {
        let mut columns = self.grid.axes.clone();
        columns.push(crate::grid::OBJECTIVE_COLUMN.to_string());
        let mut table = ResultTable::new(columns)?;
        let mut row = self.best.point.clone();
        row.push(self.best.objective_value);
        table.push_row(row)?;
        Ok(table)
    }
}

/// Runs grid search and refinement on `problem`.
pub fn optimize_timing<P: TimingProblem>(
    problem: &P,
    optimizer: &OptimizerConfig,
) -> Result<OptimizationResult, VaxError> {
    optimizer.validate()?;
    let config = problem.config();
    let space = problem.search_space(optimizer.grid_step)?;
    let objective = |point: &[f64]| problem.objective(point);
    let outcome = optimize(&space, &optimizer.refinement, &objective)?;
    let model = problem.model(&outcome.best.point)?.ok_or_else(|| {
        VaxError::Optimization(
            ErrorInfo::new("optimum-infeasible", "refined optimum is infeasible")
                .with_context("point", format!("{:?}", outcome.best.point)),
        )
    })?;
    let days: Vec<f64> = (0..config.period).map(|day| day as f64).collect();
    let best_trajectory = model.trajectory(&days)?;
    info!(
        best = ?outcome.best.point,
        value = outcome.best.objective_value,
        grid_value = outcome.grid_best().objective_value,
        "vaccination timing optimised"
    );
    Ok(OptimizationResult {
        provenance: RunProvenance::new(config.config_hash()?, config.cohort.seed),
        grid_best: outcome.grid_best().clone(),
        grid: outcome.grid,
        best: outcome.best,
        best_trajectory,
    })
}

/// Yearly campaign window `[start, start + duration)` with a precomputed profile.
#[derive(Debug, Clone)]
pub struct CampaignTimingProblem<'a> {
    config: &'a ModelConfig,
    profile: &'a VaccinatedProfile,
    generation_time: GenerationTime,
}

impl<'a> CampaignTimingProblem<'a> {
    /// Binds a validated configuration to the profile of its population.
    pub fn new(config: &'a ModelConfig, profile: &'a VaccinatedProfile) -> Result<Self, VaxError> {
        let generation_time = config.validated_generation_time()?;
        if config.immunity.is_none() {
            return Err(VaxError::Config(ErrorInfo::new(
                "immunity-missing",
                "campaign timing requires population immunity parameters",
            )));
        }
        Ok(Self {
            config,
            profile,
            generation_time,
        })
    }

    /// Campaign encoded by a `(start, duration)` point.
    pub fn campaign(&self, point: &[f64]) -> VaccinationCampaign {
        VaccinationCampaign::from_start_duration(point[0], point[1], self.config.campaign.coverage)
    }
}

impl TimingProblem for CampaignTimingProblem<'_> {
    fn config(&self) -> &ModelConfig {
        self.config
    }

    fn search_space(&self, grid_step: f64) -> Result<SearchSpace, VaxError> {
        let period = self.config.period as f64;
        SearchSpace::new(vec![
            SearchAxis::new(CAMPAIGN_AXES[0], 0.0, period, grid_step),
            SearchAxis::new(CAMPAIGN_AXES[1], 1.0, period, grid_step).with_grid_origin(grid_step),
        ])
    }

    fn model(&self, point: &[f64]) -> Result<Option<OutbreakRiskModel>, VaxError> {
        let susceptibility = campaign_susceptibility(self.config, self.profile, &self.campaign(point))?;
        OutbreakRiskModel::from_parts(self.config, self.generation_time.clone(), susceptibility).map(Some)
    }
}

/// Within-period dose times given to every vaccinated individual each period.
#[derive(Debug, Clone)]
pub struct BoostScheduleProblem<'a> {
    config: &'a ModelConfig,
    doses: usize,
    generation_time: GenerationTime,
}

impl<'a> BoostScheduleProblem<'a> {
    /// `doses` dose times per period; coverage is taken from the configured campaign.
    pub fn new(config: &'a ModelConfig, doses: usize) -> Result<Self, VaxError> {
        let generation_time = config.validated_generation_time()?;
        if config.immunity.is_none() {
            return Err(VaxError::Config(ErrorInfo::new(
                "immunity-missing",
                "boost schedules require population immunity parameters",
            )));
        }
        if doses == 0 {
            return Err(VaxError::Config(ErrorInfo::new(
                "doses",
                "a boost schedule needs at least one dose per period",
            )));
        }
        Ok(Self {
            config,
            doses,
            generation_time,
        })
    }

    /// Axis names `vaccination_time`, `vaccination_time_2`, ….
    pub fn axis_names(&self) -> Vec<String> {
        (1..=self.doses)
            .map(|dose| match dose {
                1 => "vaccination_time".to_string(),
                n => format!("vaccination_time_{n}"),
            })
            .collect()
    }

    /// Population susceptibility for the dose times at `point`, or `None` if they are not increasing.
    pub fn susceptibility(&self, point: &[f64]) -> Result<Option<Vec<f64>>, VaxError> {
        if point.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Ok(None);
        }
        let Some(immunity) = &self.config.immunity else {
            return Ok(None);
        };
        let schedule = PeriodicSchedule::new(self.config.period as f64, point.to_vec())?;
        let profile = VaccinatedProfile::compute_periodic(
            immunity,
            &self.config.susceptibility,
            &schedule,
            &self.config.cohort,
        )?;
        let coverage = self.config.campaign.coverage;
        Ok(Some(
            profile
                .values()
                .iter()
                .map(|value| coverage * value + (1.0 - coverage))
                .collect(),
        ))
    }
}

impl TimingProblem for BoostScheduleProblem<'_> {
    fn config(&self) -> &ModelConfig {
        self.config
    }

    fn search_space(&self, grid_step: f64) -> Result<SearchSpace, VaxError> {
        let last_day = (self.config.period - 1) as f64;
        SearchSpace::new(
            self.axis_names()
                .into_iter()
                .map(|name| SearchAxis::new(name, 0.0, last_day, grid_step))
                .collect(),
        )
    }

    fn model(&self, point: &[f64]) -> Result<Option<OutbreakRiskModel>, VaxError> {
        match self.susceptibility(point)? {
            Some(values) => {
                OutbreakRiskModel::from_parts(self.config, self.generation_time.clone(), values).map(Some)
            }
            None => Ok(None),
        }
    }
}
