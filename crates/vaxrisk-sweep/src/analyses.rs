//! Canned analyses returning result tables.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::ResultTable;
use vaxrisk_immune::{within_host_summary, PeriodicSchedule, VaccinatedProfile, VaccinationCampaign};
use vaxrisk_transmission::{
    branching_outbreak_risk, instantaneous_outbreak_risk, BranchingConfig, Dispersion, ModelConfig,
    OutbreakRiskModel, SeasonalReproduction, SimulationConfig, TrialStatus,
};

/// Column names of [`vaccination_example`].
pub const VACCINATION_EXAMPLE_COLUMNS: [&str; 8] = [
    "time",
    "unvaccinated_reproduction_number",
    "reproduction_number",
    "susceptibility",
    "case_outbreak_risk",
    "outbreak_risk",
    "case_outbreak_risk_unvaccinated",
    "outbreak_risk_unvaccinated",
];

/// Column names of the branching table of [`methods_comparison`].
pub const BRANCHING_COLUMNS: [&str; 5] = [
    "reproduction_number",
    "dispersion",
    "analytic",
    "monte_carlo",
    "standard_error",
];

const DAYS_IN_MONTH: [usize; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn analysis_error(code: &str, message: impl Into<String>) -> VaxError {
    VaxError::Config(ErrorInfo::new(code, message))
}

/// Daily series over two periods under the configured campaign, with the
/// unvaccinated counterparts of both outbreak risks.
pub fn vaccination_example(
    config: &ModelConfig,
    profile: &VaccinatedProfile,
) -> Result<ResultTable, VaxError> {
    let times: Vec<f64> = (0..2 * config.period).map(|day| day as f64).collect();
    let vaccinated = OutbreakRiskModel::with_profile(config, profile)?.trajectory(&times)?;
    let unvaccinated_campaign = VaccinationCampaign {
        coverage: 0.0,
        ..config.campaign
    };
    let unvaccinated = OutbreakRiskModel::with_campaign(config, profile, &unvaccinated_campaign)?;
    let columns = vec![
        vaccinated.time,
        vaccinated.unvaccinated_reproduction_number,
        vaccinated.reproduction_number,
        vaccinated.susceptibility,
        vaccinated.case_outbreak_risk,
        vaccinated.outbreak_risk,
        unvaccinated.case_outbreak_risk(&times)?,
        unvaccinated.instantaneous_outbreak_risk(&times)?,
    ];
    ResultTable::from_columns(
        VACCINATION_EXAMPLE_COLUMNS
            .iter()
            .map(|name| name.to_string())
            .zip(columns)
            .collect(),
    )
}

/// Within-host summary when every individual is vaccinated on day 0 of each period.
pub fn within_host_example(config: &ModelConfig) -> Result<ResultTable, VaxError> {
    let immunity = config.immunity.as_ref().ok_or_else(|| {
        analysis_error(
            "immunity-missing",
            "within-host summaries require population immunity parameters",
        )
    })?;
    let schedule = PeriodicSchedule::new(config.period as f64, vec![0.0])?;
    within_host_summary(immunity, &config.susceptibility, &schedule, &config.cohort)
}

fn default_comparison_reproduction() -> SeasonalReproduction {
    SeasonalReproduction {
        mean: 2.0,
        proportional_variation: 0.5,
        peak_time: 0.0,
    }
}

fn default_comparison_dispersions() -> Vec<Dispersion> {
    [0.1, 0.41, 1.0, 10.0, 100.0, 1e6]
        .into_iter()
        .map(Dispersion::negative_binomial)
        .collect()
}

fn default_branching_reproduction_numbers() -> Vec<f64> {
    vec![1.5, 2.0, 3.0]
}

/// Settings of the analytic-versus-simulation comparison without vaccination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodsComparisonConfig {
    /// Seasonal reproduction number replacing the configured one.
    #[serde(default = "default_comparison_reproduction")]
    pub reproduction: SeasonalReproduction,
    /// Offspring distributions compared.
    #[serde(default = "default_comparison_dispersions")]
    pub dispersions: Vec<Dispersion>,
    /// Renewal simulation settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Constant reproduction numbers of the branching comparison.
    #[serde(default = "default_branching_reproduction_numbers")]
    pub branching_reproduction_numbers: Vec<f64>,
    /// Branching Monte Carlo settings.
    #[serde(default)]
    pub branching: BranchingConfig,
}

impl Default for MethodsComparisonConfig {
    fn default() -> Self {
        Self {
            reproduction: default_comparison_reproduction(),
            dispersions: default_comparison_dispersions(),
            simulation: SimulationConfig::default(),
            branching_reproduction_numbers: default_branching_reproduction_numbers(),
            branching: BranchingConfig::default(),
        }
    }
}

/// Tables of the methods comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodsComparison {
    /// `time`, `reproduction_number` over two periods.
    pub reproduction: ResultTable,
    /// `time` and the case outbreak risk per dispersion over two periods.
    pub analytic: ResultTable,
    /// `time` and the simulated risk plus standard error per dispersion at month starts.
    pub simulated: ResultTable,
    /// Instantaneous risk against branching Monte Carlo at constant reproduction numbers.
    pub branching: ResultTable,
}

/// Column label of a dispersion mode.
pub fn dispersion_label(dispersion: &Dispersion) -> String {
    match dispersion {
        Dispersion::NegativeBinomial { k } => k.to_string(),
        Dispersion::Poisson => "poisson".to_string(),
    }
}

/// First day of each month over `periods` periods.
///
/// A 365-day period uses calendar months; other periods use twelve equal months.
pub fn month_starts(period: usize, periods: usize) -> Vec<f64> {
    let starts: Vec<usize> = if period == 365 {
        DAYS_IN_MONTH
            .iter()
            .scan(0, |day, &length| {
                let start = *day;
                *day += length;
                Some(start)
            })
            .collect()
    } else {
        (0..12).map(|month| month * (period / 12)).collect()
    };
    (0..periods)
        .flat_map(|cycle| starts.iter().map(move |&start| (start + cycle * period) as f64))
        .collect()
}

/// Unvaccinated case outbreak risk computed analytically and by simulation for each
/// dispersion, plus the branching-process check of the instantaneous risk.
pub fn methods_comparison(
    config: &ModelConfig,
    comparison: &MethodsComparisonConfig,
) -> Result<MethodsComparison, VaxError> {
    if comparison.dispersions.is_empty() {
        return Err(analysis_error(
            "dispersions-empty",
            "methods comparison needs at least one dispersion",
        ));
    }
    let times: Vec<f64> = (0..2 * config.period).map(|day| day as f64).collect();
    let simulation_times = month_starts(config.period, 2);
    info!(
        dispersions = comparison.dispersions.len(),
        start_times = simulation_times.len(),
        simulations = comparison.simulation.simulations,
        "running methods comparison"
    );

    let mut analytic = vec![("time".to_string(), times.clone())];
    let mut simulated = vec![("time".to_string(), simulation_times.clone())];
    let mut reproduction = None;
    for dispersion in &comparison.dispersions {
        let scenario = ModelConfig {
            reproduction: comparison.reproduction,
            dispersion: *dispersion,
            immunity: None,
            ..config.clone()
        };
        let model = OutbreakRiskModel::new(&scenario)?;
        if reproduction.is_none() {
            reproduction = Some(model.reproduction_number(&times));
        }
        let label = dispersion_label(dispersion);
        analytic.push((label.clone(), model.case_outbreak_risk(&times)?));
        let estimates = model.simulated_outbreak_risk(&simulation_times, &comparison.simulation)?;
        simulated.push((
            label.clone(),
            estimates.iter().map(|estimate| estimate.fraction).collect(),
        ));
        simulated.push((
            format!("{label}_standard_error"),
            estimates.iter().map(|estimate| estimate.standard_error).collect(),
        ));
    }
    let reproduction = ResultTable::from_columns(vec![
        ("time".to_string(), times),
        (
            "reproduction_number".to_string(),
            reproduction.unwrap_or_default(),
        ),
    ])?;

    let mut branching = ResultTable::new(BRANCHING_COLUMNS)?;
    let rows: Vec<Vec<f64>> = comparison
        .branching_reproduction_numbers
        .par_iter()
        .flat_map_iter(|&r| comparison.dispersions.iter().map(move |dispersion| (r, dispersion)))
        .map(|(r, dispersion)| {
            let estimate = branching_outbreak_risk(r, dispersion, &comparison.branching)?;
            let analytic = instantaneous_outbreak_risk(r, dispersion, &config.solver)?;
            let k = match dispersion {
                Dispersion::NegativeBinomial { k } => *k,
                Dispersion::Poisson => f64::INFINITY,
            };
            Ok::<_, VaxError>(vec![r, k, analytic, estimate.fraction, estimate.standard_error])
        })
        .collect::<Result<_, VaxError>>()?;
    for row in rows {
        branching.push_row(row)?;
    }

    Ok(MethodsComparison {
        reproduction,
        analytic: ResultTable::from_columns(analytic)?,
        simulated: ResultTable::from_columns(simulated)?,
        branching,
    })
}

fn default_example_start() -> f64 {
    90.0
}

fn default_example_runs() -> u64 {
    100
}

fn default_example_days() -> usize {
    50
}

fn default_example_seed() -> u64 {
    11
}

/// Settings of the illustrative simulation runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationExamplesConfig {
    /// Reproduction number of the illustration.
    #[serde(default = "default_comparison_reproduction")]
    pub reproduction: SeasonalReproduction,
    /// Day of the initial case.
    #[serde(default = "default_example_start")]
    pub start_time: f64,
    /// Number of runs.
    #[serde(default = "default_example_runs")]
    pub runs: u64,
    /// Days tabulated after the initial case.
    #[serde(default = "default_example_days")]
    pub days: usize,
    /// Seed of the runs.
    #[serde(default = "default_example_seed")]
    pub seed: u64,
}

impl Default for SimulationExamplesConfig {
    fn default() -> Self {
        Self {
            reproduction: default_comparison_reproduction(),
            start_time: default_example_start(),
            runs: default_example_runs(),
            days: default_example_days(),
            seed: default_example_seed(),
        }
    }
}

/// Daily incidence of individual runs: columns `time` and `simulation_<i>`.
///
/// Days after a run goes extinct read zero. Runs stop at the incidence cutoff
/// and the days after that are NaN.
pub fn simulation_examples(
    config: &ModelConfig,
    examples: &SimulationExamplesConfig,
) -> Result<ResultTable, VaxError> {
    let scenario = ModelConfig {
        reproduction: examples.reproduction,
        immunity: None,
        ..config.clone()
    };
    let model = OutbreakRiskModel::new(&scenario)?;
    let simulation = SimulationConfig {
        seed: examples.seed,
        ..scenario.simulation
    };
    let outcomes = (0..examples.runs)
        .into_par_iter()
        .map(|run| model.simulate(examples.start_time, &simulation, run))
        .collect::<Result<Vec<_>, _>>()?;
    let mut columns = vec![(
        "time".to_string(),
        (0..examples.days).map(|day| day as f64).collect(),
    )];
    for (run, outcome) in outcomes.iter().enumerate() {
        let filler = if outcome.status == TrialStatus::Extinct {
            0.0
        } else {
            f64::NAN
        };
        let incidence = (0..examples.days)
            .map(|day| {
                outcome
                    .incidence
                    .get(day)
                    .map_or(filler, |&cases| cases as f64)
            })
            .collect();
        columns.push((format!("simulation_{run}"), incidence));
    }
    ResultTable::from_columns(columns)
}
