//! Wide, date-indexed table of optional numeric columns.
//!
//! The table is the unit of work threaded through every pipeline stage.
//! Stages never mutate a table they were given: `with_column` and friends
//! return a new table that shares nothing mutable with the input.
//!
//! Missing values are `None`. Non-finite arithmetic results (NaN, ±inf) are
//! normalised to `None` at construction so that "missing" has exactly one
//! representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Where a column came from.
///
/// Carried alongside every column so later stages can decide what to
/// (re)process without inspecting the shape of the column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    /// Loaded from the input file or produced by acquisition.
    Raw,
    /// Per-asset technical indicator (MA, volatility, momentum, RSI).
    Indicator,
    /// Cross-sectional market statistic.
    MarketAggregate,
    /// Broad-market / volatility-index relationship.
    Regime,
}

/// A single named series aligned to the table's date index.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub provenance: Provenance,
    pub values: Vec<Option<f64>>,
}

impl Column {
    /// Build a column, normalising non-finite values to `None`.
    pub fn new(name: impl Into<String>, provenance: Provenance, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            provenance,
            values: values
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect(),
        }
    }

    /// Raw column from plain `f64`s, where NaN marks a missing value.
    pub fn raw(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(
            name,
            Provenance::Raw,
            values.iter().map(|&v| Some(v)).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of present (non-missing) values.
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("dates not strictly increasing at row {row}: {previous} then {current}")]
    NonMonotonicDates {
        row: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
}

/// Date-indexed table with a name for the index column (e.g. "Date").
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index_name: String,
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl Table {
    /// Empty table over the given dates.
    pub fn new(index_name: impl Into<String>, dates: Vec<NaiveDate>) -> Self {
        Self {
            index_name: index_name.into(),
            dates,
            columns: Vec::new(),
        }
    }

    /// Build a table from parts, checking shape, uniqueness and date order.
    pub fn from_columns(
        index_name: impl Into<String>,
        dates: Vec<NaiveDate>,
        columns: Vec<Column>,
    ) -> Result<Self, TableError> {
        let table = Self {
            index_name: index_name.into(),
            dates,
            columns,
        };
        table.validate()?;
        Ok(table)
    }

    /// Check the table invariants: strictly increasing dates, unique column
    /// names, every column as long as the date index.
    pub fn validate(&self) -> Result<(), TableError> {
        for (row, pair) in self.dates.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(TableError::NonMonotonicDates {
                    row: row + 1,
                    previous: pair[0],
                    current: pair[1],
                });
            }
        }

        let mut seen = HashSet::with_capacity(self.columns.len());
        for col in &self.columns {
            if !seen.insert(col.name.as_str()) {
                return Err(TableError::DuplicateColumn(col.name.clone()));
            }
            if col.len() != self.dates.len() {
                return Err(TableError::LengthMismatch {
                    column: col.name.clone(),
                    expected: self.dates.len(),
                    actual: col.len(),
                });
            }
        }
        Ok(())
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Values of a named column.
    pub fn values(&self, name: &str) -> Option<&[Option<f64>]> {
        self.column(name).map(|c| c.values.as_slice())
    }

    /// Value at a row of a named column. `None` if the column is absent,
    /// the row is out of range, or the cell is missing.
    pub fn get(&self, name: &str, row: usize) -> Option<f64> {
        self.values(name).and_then(|v| v.get(row).copied().flatten())
    }

    /// Return a copy of this table with `column` appended.
    pub fn with_column(&self, column: Column) -> Result<Self, TableError> {
        self.with_columns(vec![column])
    }

    /// Return a copy of this table with `columns` appended in order.
    pub fn with_columns(&self, columns: Vec<Column>) -> Result<Self, TableError> {
        let mut out = self.clone();
        out.push_columns(columns)?;
        Ok(out)
    }

    /// Append columns to an owned table. Used by constructors that build a
    /// table up from scratch; stages go through `with_columns`.
    pub(crate) fn push_columns(&mut self, columns: Vec<Column>) -> Result<(), TableError> {
        for col in columns {
            let actual = col.len();
            if actual != self.dates.len() {
                return Err(TableError::LengthMismatch {
                    column: col.name,
                    expected: self.dates.len(),
                    actual,
                });
            }
            if self.has_column(&col.name) {
                return Err(TableError::DuplicateColumn(col.name));
            }
            self.columns.push(col);
        }
        Ok(())
    }

    /// Whether every column has a value at `row`.
    pub fn row_is_complete(&self, row: usize) -> bool {
        self.columns
            .iter()
            .all(|c| c.values.get(row).copied().flatten().is_some())
    }

    /// Keep only the rows for which `keep(row)` is true, preserving order.
    pub fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> Self {
        let rows: Vec<usize> = (0..self.n_rows()).filter(|&r| keep(r)).collect();
        Self {
            index_name: self.index_name.clone(),
            dates: rows.iter().map(|&r| self.dates[r]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    provenance: c.provenance,
                    values: rows.iter().map(|&r| c.values[r]).collect(),
                })
                .collect(),
        }
    }

    /// Drop every row that has a missing value in any column.
    pub fn drop_incomplete_rows(&self) -> Self {
        self.filter_rows(|r| self.row_is_complete(r))
    }

    /// Drop rows where every column is missing. Partially filled rows stay.
    pub fn drop_empty_rows(&self) -> Self {
        self.filter_rows(|r| {
            self.columns
                .iter()
                .any(|c| c.values.get(r).copied().flatten().is_some())
        })
    }
}
