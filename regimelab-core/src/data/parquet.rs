//! Parquet export of a feature table.
//!
//! The date index becomes a `Date` column; every other column is a nullable
//! `Float64`. The file is written atomically like the CSV output.

use super::provider::DataError;
use super::write_atomic;
use crate::table::Table;
use chrono::NaiveDate;
use polars::prelude::{Column as FrameColumn, DataFrame, DataType, ParquetWriter};
use std::path::Path;
use tracing::debug;

/// Convert a table to a polars DataFrame.
pub fn to_dataframe(table: &Table) -> Result<DataFrame, DataError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| DataError::Other("invalid epoch".into()))?;
    let days: Vec<i32> = table
        .dates()
        .iter()
        .map(|d| (*d - epoch).num_days() as i32)
        .collect();

    let mut columns = Vec::with_capacity(table.n_cols() + 1);
    columns.push(
        FrameColumn::new(table.index_name().into(), days)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
    );
    for column in table.columns() {
        columns.push(FrameColumn::new(
            column.name.as_str().into(),
            column.values.clone(),
        ));
    }

    DataFrame::new(columns).map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

pub fn write_parquet(table: &Table, path: &Path) -> Result<(), DataError> {
    let mut df = to_dataframe(table)?;
    let mut buf = Vec::new();
    ParquetWriter::new(&mut buf)
        .finish(&mut df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    write_atomic(path, &buf)
        .map_err(|e| DataError::ParquetError(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), rows = table.n_rows(), "wrote parquet");
    Ok(())
}
