//! Scalar objectives over one period of an outbreak-risk trajectory.

use serde::{Deserialize, Serialize};
use vaxrisk_core::errors::{ErrorInfo, VaxError};
use vaxrisk_core::require_non_negative;

fn objective_error(code: &str, message: impl Into<String>) -> VaxError {
    VaxError::Config(ErrorInfo::new(code, message))
}

/// Half-open range of days `[start, end)` within a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    /// First day included.
    pub start: usize,
    /// First day excluded.
    pub end: usize,
}

/// Days of December and January, the usual winter window.
pub fn december_january(period: usize) -> Vec<DayWindow> {
    let (january, december) = if period == 365 {
        (31, 31)
    } else {
        (period / 12, period / 12)
    };
    vec![
        DayWindow {
            start: 0,
            end: january,
        },
        DayWindow {
            start: period - december,
            end: period,
        },
    ]
}

/// Function reducing daily risks to a scalar to be minimised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ObjectiveFunction {
    /// Peak risk over the period.
    #[default]
    Peak,
    /// Mean risk over the period.
    Mean,
    /// Mean risk over the union of the given windows.
    WindowMean {
        /// Day windows averaged together.
        windows: Vec<DayWindow>,
    },
    /// Mean weighted by the baseline seasonal reproduction number above its minimum.
    SeasonalWeightedMean,
    /// `peak + mean_weight · mean`.
    PeakPlusMean {
        /// Weight of the mean term.
        mean_weight: f64,
    },
    /// Peak plus the mean over the given windows.
    PeakPlusWindowMean {
        /// Day windows averaged together.
        windows: Vec<DayWindow>,
    },
}

/// Which outbreak risk the objective is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RiskMeasure {
    /// Case outbreak risk over the generation-time window.
    #[default]
    Case,
    /// Instantaneous outbreak risk at the introduction time.
    Instantaneous,
}

/// Objective function together with the risk it is applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ObjectiveConfig {
    /// Reduction of daily risks.
    #[serde(default)]
    pub function: ObjectiveFunction,
    /// Risk measure fed to the reduction.
    #[serde(default)]
    pub measure: RiskMeasure,
}

impl ObjectiveFunction {
    /// Short stable label used in scenario names.
    pub fn label(&self) -> &'static str {
        match self {
            ObjectiveFunction::Peak => "peak",
            ObjectiveFunction::Mean => "mean",
            ObjectiveFunction::WindowMean { .. } => "window-mean",
            ObjectiveFunction::SeasonalWeightedMean => "seasonal-weighted-mean",
            ObjectiveFunction::PeakPlusMean { .. } => "peak-plus-mean",
            ObjectiveFunction::PeakPlusWindowMean { .. } => "peak-plus-window-mean",
        }
    }

    /// Checks windows against the period and weights for finiteness.
    pub fn validate(&self, period: usize) -> Result<(), VaxError> {
        match self {
            ObjectiveFunction::WindowMean { windows }
            | ObjectiveFunction::PeakPlusWindowMean { windows } => {
                if windows.iter().all(|window| window.start >= window.end) {
                    return Err(objective_error(
                        "objective-window-empty",
                        "objective windows must cover at least one day",
                    ));
                }
                if let Some(window) = windows.iter().find(|window| window.end > period) {
                    return Err(VaxError::Config(
                        ErrorInfo::new("objective-window", "objective window exceeds the period")
                            .with_context("end", window.end)
                            .with_context("period", period),
                    ));
                }
                Ok(())
            }
            ObjectiveFunction::PeakPlusMean { mean_weight } => {
                require_non_negative("mean_weight", *mean_weight)
            }
            _ => Ok(()),
        }
    }

    /// Reduces daily risks `risk[0..period]`; `seasonal_weights` feeds the weighted mean.
    pub fn evaluate(&self, risk: &[f64], seasonal_weights: &[f64]) -> f64 {
        match self {
            ObjectiveFunction::Peak => peak(risk),
            ObjectiveFunction::Mean => mean(risk),
            ObjectiveFunction::WindowMean { windows } => window_mean(risk, windows),
            ObjectiveFunction::SeasonalWeightedMean => risk
                .iter()
                .zip(seasonal_weights)
                .map(|(value, weight)| value * weight)
                .sum(),
            ObjectiveFunction::PeakPlusMean { mean_weight } => peak(risk) + mean_weight * mean(risk),
            ObjectiveFunction::PeakPlusWindowMean { windows } => {
                peak(risk) + window_mean(risk, windows)
            }
        }
    }
}

fn peak(risk: &[f64]) -> f64 {
    risk.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}

fn mean(risk: &[f64]) -> f64 {
    risk.iter().sum::<f64>() / risk.len() as f64
}

fn window_mean(risk: &[f64], windows: &[DayWindow]) -> f64 {
    let values: Vec<f64> = windows
        .iter()
        .flat_map(|window| risk[window.start..window.end.max(window.start)].iter().copied())
        .collect();
    mean(&values)
}
