//! Within-host cohort summaries.

use vaxrisk_core::errors::VaxError;
use vaxrisk_core::ResultTable;

use crate::periodic::PeriodicSchedule;
use crate::population::PopulationImmunity;
use crate::profile::{cohort_titers, CohortConfig};
use crate::susceptibility::HillSusceptibility;

/// Column names of [`within_host_summary`].
pub const SUMMARY_COLUMNS: [&str; 9] = [
    "time",
    "log10_antibodies_mean",
    "log10_antibodies_median",
    "log10_antibodies_95ci_lower",
    "log10_antibodies_95ci_upper",
    "susceptibility_mean",
    "susceptibility_median",
    "susceptibility_95ci_lower",
    "susceptibility_95ci_upper",
];

/// Per-day cohort distribution of log10 titer and susceptibility under `schedule`.
///
/// One row per day `0..period` with the mean, median and 2.5/97.5 percentiles.
pub fn within_host_summary(
    immunity: &PopulationImmunity,
    map: &HillSusceptibility,
    schedule: &PeriodicSchedule,
    cohort: &CohortConfig,
) -> Result<ResultTable, VaxError> {
    map.validate()?;
    let period = schedule.period().round().max(1.0) as usize;
    let times: Vec<f64> = (0..period).map(|day| day as f64).collect();
    let sampler = immunity.sampler()?;
    let expanded = schedule.expand(cohort.burn_in_periods, (period - 1) as f64)?;
    let titers = cohort_titers(&sampler, &expanded, &times, cohort)?;

    let mut table = ResultTable::new(SUMMARY_COLUMNS)?;
    for (day, &time) in times.iter().enumerate() {
        let log_titers: Vec<f64> = titers.iter().map(|row| row[day].log10()).collect();
        let susceptibilities: Vec<f64> = titers
            .iter()
            .map(|row| map.susceptibility(row[day]))
            .collect();
        let mut row = vec![time];
        row.extend(summarise(log_titers));
        row.extend(summarise(susceptibilities));
        table.push_row(row)?;
    }
    Ok(table)
}

fn summarise(mut values: Vec<f64>) -> [f64; 4] {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.sort_by(|a, b| a.total_cmp(b));
    [
        mean,
        percentile(&values, 0.5),
        percentile(&values, 0.025),
        percentile(&values, 0.975),
    ]
}

/// Linear-interpolation percentile of sorted values.
pub fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = quantile * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = position - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}
