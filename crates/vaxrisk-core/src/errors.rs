//! Structured error types shared across vaxrisk crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`VaxError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (parameter names, offending values, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the vaxrisk engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum VaxError {
    /// Invalid parameters or schedules rejected before any computation.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Numerical solvers that did not reach their tolerance within the iteration cap.
    #[error("convergence error: {0}")]
    Convergence(ErrorInfo),
    /// Stochastic simulation failures (distribution construction, sampling).
    #[error("simulation error: {0}")]
    Simulation(ErrorInfo),
    /// Search space or objective failures raised by the optimiser.
    #[error("optimization error: {0}")]
    Optimization(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl VaxError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            VaxError::Config(info)
            | VaxError::Convergence(info)
            | VaxError::Simulation(info)
            | VaxError::Optimization(info)
            | VaxError::Serde(info) => info,
        }
    }

    /// Returns true when the error was raised by configuration validation.
    pub fn is_config(&self) -> bool {
        matches!(self, VaxError::Config(_))
    }
}

/// Shorthand for a configuration error with a single offending parameter.
pub fn invalid_parameter(code: &str, name: &str, value: impl ToString, expected: &str) -> VaxError {
    VaxError::Config(
        ErrorInfo::new(code, format!("parameter `{name}` must be {expected}"))
            .with_context("parameter", name)
            .with_context("value", value.to_string()),
    )
}

/// Ensures a parameter is finite and strictly positive.
pub fn require_positive(name: &str, value: f64) -> Result<(), VaxError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid_parameter("non-positive", name, value, "finite and > 0"))
    }
}

/// Ensures a parameter is finite and non-negative.
pub fn require_non_negative(name: &str, value: f64) -> Result<(), VaxError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid_parameter("negative", name, value, "finite and >= 0"))
    }
}

/// Ensures a parameter lies in the closed unit interval.
pub fn require_unit_interval(name: &str, value: f64) -> Result<(), VaxError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid_parameter("out-of-unit-interval", name, value, "within [0, 1]"))
    }
}
