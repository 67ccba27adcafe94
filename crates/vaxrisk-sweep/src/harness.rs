//! Runs every scenario of a sweep against shared, read-only vaccinated profiles.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vaxrisk_core::errors::VaxError;
use vaxrisk_core::{from_yaml_str, stable_hash_string, ResultTable, RunProvenance};
use vaxrisk_immune::VaccinatedProfile;
use vaxrisk_opt::{optimize_timing, CampaignTimingProblem, OptimizationResult, OptimizerConfig};
use vaxrisk_transmission::{vaccinated_profile, ModelConfig, OutbreakRiskModel, RiskTrajectory};

use crate::scenario::{reference_axes, Scenario, ScenarioLabel, SweepAxis};

fn default_true() -> bool {
    true
}

/// Axes to vary and what to compute for each scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPlan {
    /// Axes varied one at a time around the base configuration.
    pub axes: Vec<SweepAxis>,
    /// Prepend the unmodified base configuration.
    #[serde(default = "default_true")]
    pub include_baseline: bool,
    /// Run the campaign-timing optimiser for vaccinated scenarios.
    #[serde(default = "default_true")]
    pub optimize: bool,
    /// Optimiser settings.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

impl SweepPlan {
    /// Plan over the given axes with the baseline and optimisation enabled.
    pub fn new(axes: Vec<SweepAxis>) -> Self {
        Self {
            axes,
            include_baseline: true,
            optimize: true,
            optimizer: OptimizerConfig::default(),
        }
    }

    /// Plan over [`reference_axes`] for a period of `period` days.
    pub fn reference(period: usize) -> Self {
        Self::new(reference_axes(period))
    }

    /// Parses a YAML plan and validates the optimiser settings.
    pub fn from_yaml_str(data: &str) -> Result<Self, VaxError> {
        let plan: Self = from_yaml_str(data)?;
        plan.optimizer.validate()?;
        Ok(plan)
    }
}

/// Outputs of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario label.
    pub label: ScenarioLabel,
    /// Stable hash of the scenario configuration.
    pub config_hash: String,
    /// Trajectory over one period under the configured campaign.
    pub trajectory: RiskTrajectory,
    /// Campaign-timing optimum, when requested and the population is vaccinated.
    pub optimization: Option<OptimizationResult>,
}

impl ScenarioResult {
    /// Trajectory table of the configured campaign.
    pub fn trajectory_table(&self) -> Result<ResultTable, VaxError> {
        self.trajectory.to_table()
    }
}

/// Every scenario result in expansion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Hash of the base configuration and plan.
    pub plan_hash: String,
    /// Provenance of the run.
    pub provenance: RunProvenance,
    /// Results in expansion order.
    pub scenarios: Vec<ScenarioResult>,
}

/// Vaccinated profiles keyed by [`ModelConfig::profile_hash`].
#[derive(Debug, Default)]
pub struct ProfileCache {
    profiles: BTreeMap<String, Arc<VaccinatedProfile>>,
}

impl ProfileCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile for `config`, computed on first request.
    pub fn get_or_compute(&mut self, config: &ModelConfig) -> Result<Arc<VaccinatedProfile>, VaxError> {
        let key = config.profile_hash()?;
        if let Some(profile) = self.profiles.get(&key) {
            return Ok(Arc::clone(profile));
        }
        let profile = vaccinated_profile(config)?;
        self.profiles.insert(key, Arc::clone(&profile));
        Ok(profile)
    }

    /// Number of distinct profiles computed.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether no profile has been computed.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Expands the plan into labelled scenarios.
pub fn expand_scenarios(base: &ModelConfig, plan: &SweepPlan) -> Result<Vec<Scenario>, VaxError> {
    base.validate()?;
    let mut scenarios = Vec::new();
    if plan.include_baseline {
        scenarios.push(Scenario {
            label: ScenarioLabel::baseline(),
            config: base.clone(),
        });
    }
    for axis in &plan.axes {
        scenarios.extend(axis.scenarios(base)?);
    }
    Ok(scenarios)
}

/// Evaluates one scenario against its profile.
pub fn run_scenario(
    scenario: &Scenario,
    profile: &VaccinatedProfile,
    plan: &SweepPlan,
) -> Result<ScenarioResult, VaxError> {
    let config = &scenario.config;
    let model = OutbreakRiskModel::with_profile(config, profile)?;
    let days: Vec<f64> = (0..config.period).map(|day| day as f64).collect();
    let trajectory = model.trajectory(&days)?;
    let optimization = if plan.optimize && config.immunity.is_some() {
        let problem = CampaignTimingProblem::new(config, profile)?;
        Some(optimize_timing(&problem, &plan.optimizer)?)
    } else {
        None
    };
    debug!(
        axis = %scenario.label.axis,
        index = scenario.label.index,
        peak = trajectory.peak_case_outbreak_risk(),
        "scenario evaluated"
    );
    Ok(ScenarioResult {
        label: scenario.label.clone(),
        config_hash: config.config_hash()?,
        trajectory,
        optimization,
    })
}

/// Runs the sweep: profiles are computed once per distinct immune setting, scenarios in parallel.
pub fn run_sweep(base: &ModelConfig, plan: &SweepPlan) -> Result<SweepReport, VaxError> {
    plan.optimizer.validate()?;
    let plan_hash = stable_hash_string(&(base, plan))?;
    let scenarios = expand_scenarios(base, plan)?;

    let mut cache = ProfileCache::new();
    let profiles: Vec<Arc<VaccinatedProfile>> = scenarios
        .iter()
        .map(|scenario| cache.get_or_compute(&scenario.config))
        .collect::<Result<_, _>>()?;
    info!(
        scenarios = scenarios.len(),
        profiles = cache.len(),
        optimize = plan.optimize,
        "running sensitivity sweep"
    );

    let results: Vec<ScenarioResult> = scenarios
        .par_iter()
        .zip(profiles.par_iter())
        .map(|(scenario, profile)| run_scenario(scenario, profile, plan))
        .collect::<Result<_, _>>()?;

    Ok(SweepReport {
        provenance: RunProvenance::new(plan_hash.clone(), base.cohort.seed),
        plan_hash,
        scenarios: results,
    })
}
