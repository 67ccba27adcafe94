//! Rectangular result tables consumed by downstream writers and plotting.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, VaxError};

fn column_error(code: &str, message: &str, column: &str) -> VaxError {
    VaxError::Serde(ErrorInfo::new(code, message).with_context("column", column))
}

/// Rectangular table of named numeric columns with one row per time point,
/// grid point or trial.
///
/// Column names are part of the output contract and are never renamed once
/// produced. The table owns no I/O; the calling layer decides how to persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ResultTable {
    /// Creates an empty table with the given column names.
    pub fn new<I, S>(columns: I) -> Result<Self, VaxError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        for (idx, name) in columns.iter().enumerate() {
            if columns[..idx].contains(name) {
                return Err(column_error(
                    "duplicate-column",
                    "column names must be unique",
                    name,
                ));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Builds a table from equally long named columns.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self, VaxError> {
        let names: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();
        let mut table = Self::new(names)?;
        let len = columns.first().map(|(_, values)| values.len()).unwrap_or(0);
        if let Some((name, _)) = columns.iter().find(|(_, values)| values.len() != len) {
            return Err(column_error(
                "ragged-columns",
                "all columns must have equal length",
                name,
            ));
        }
        table.rows = (0..len)
            .map(|row| columns.iter().map(|(_, values)| values[row]).collect())
            .collect();
        Ok(table)
    }

    /// Appends a row; its width must match the number of columns.
    pub fn push_row(&mut self, row: Vec<f64>) -> Result<(), VaxError> {
        if row.len() != self.columns.len() {
            return Err(VaxError::Serde(
                ErrorInfo::new("row-width", "row width does not match the column count")
                    .with_context("expected", self.columns.len())
                    .with_context("actual", row.len()),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Returns the column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns all rows in insertion order.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Extracts a column by name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|column| column == name)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }
}
