//! Wide CSV reader and writer.
//!
//! Layout: header `Date,COL1,COL2,...`, one row per trading day, ISO dates
//! in the first column and prices in the rest. Empty, `NaN`, `nan`, `NA` and
//! `null` cells read as missing; any other non-numeric cell, infinities
//! included, is an error that names the row and column. Missing values are written as empty cells.

use super::write_atomic;
use crate::table::{Column, Provenance, Table, TableError};
use chrono::NaiveDate;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const MISSING_TOKENS: [&str; 5] = ["", "NaN", "nan", "NA", "null"];

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing header row")]
    MissingHeader,

    #[error("duplicate column '{0}' in header")]
    DuplicateColumn(String),

    #[error("row {row}: invalid date '{value}'")]
    BadDate { row: usize, value: String },

    #[error("row {row}, column '{column}': non-numeric value '{value}'")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: date {current} does not follow {previous}")]
    NonMonotonicDates {
        row: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("invalid table: {0}")]
    Table(#[from] TableError),
}

/// Read a wide CSV file. Rows are numbered from 1 (the first data row).
pub fn read_table(path: &Path) -> Result<Table, CsvError> {
    let file = std::fs::File::open(path)?;
    let table = read_table_from(file)?;
    debug!(
        path = %path.display(),
        rows = table.n_rows(),
        columns = table.n_cols(),
        "read price table"
    );
    Ok(table)
}

pub fn read_table_from<R: Read>(reader: R) -> Result<Table, CsvError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut names = headers.iter();
    let index_name = names.next().ok_or(CsvError::MissingHeader)?.to_string();
    let names: Vec<String> = names.map(str::to_string).collect();

    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) || *name == index_name {
            return Err(CsvError::DuplicateColumn(name.clone()));
        }
    }

    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];

    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;

        let raw_date = record.get(0).unwrap_or_default();
        let date = parse_date(raw_date).ok_or_else(|| CsvError::BadDate {
            row,
            value: raw_date.to_string(),
        })?;
        if let Some(&previous) = dates.last() {
            if date <= previous {
                return Err(CsvError::NonMonotonicDates {
                    row,
                    previous,
                    current: date,
                });
            }
        }
        dates.push(date);

        for (col, name) in names.iter().enumerate() {
            let cell = record.get(col + 1).unwrap_or_default();
            let value = parse_cell(cell).ok_or_else(|| CsvError::NonNumeric {
                row,
                column: name.clone(),
                value: cell.to_string(),
            })?;
            values[col].push(value);
        }
    }

    let columns = names
        .into_iter()
        .zip(values)
        .map(|(name, v)| Column::new(name, Provenance::Raw, v))
        .collect();
    Ok(Table::from_columns(index_name, dates, columns)?)
}

/// Write a table as CSV, replacing `path` atomically.
pub fn write_table(table: &Table, path: &Path) -> Result<(), CsvError> {
    let mut buf = Vec::new();
    write_table_to(table, &mut buf)?;
    write_atomic(path, &buf)?;
    debug!(
        path = %path.display(),
        rows = table.n_rows(),
        columns = table.n_cols(),
        "wrote table"
    );
    Ok(())
}

pub fn write_table_to<W: Write>(table: &Table, writer: W) -> Result<(), CsvError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(table.n_cols() + 1);
    header.push(table.index_name());
    header.extend(table.column_names());
    wtr.write_record(&header)?;

    let mut record: Vec<String> = Vec::with_capacity(table.n_cols() + 1);
    for (row, date) in table.dates().iter().enumerate() {
        record.clear();
        record.push(date.format("%Y-%m-%d").to_string());
        for col in table.columns() {
            record.push(match col.values[row] {
                Some(v) => format!("{v}"),
                None => String::new(),
            });
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// ISO date, optionally followed by a time part (`2024-01-02 00:00:00`,
/// `2024-01-02T00:00:00-05:00`), which is ignored.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    let (day, rest) = (raw.get(..10)?, raw.get(10..)?);
    if rest.starts_with(' ') || rest.starts_with('T') {
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    } else {
        None
    }
}

/// `Some(None)` for a missing cell, `None` for garbage. Infinities and
/// NaN spellings outside the missing tokens are garbage.
fn parse_cell(cell: &str) -> Option<Option<f64>> {
    if MISSING_TOKENS.contains(&cell) {
        return Some(None);
    }
    let v: f64 = cell.parse().ok()?;
    v.is_finite().then_some(Some(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date,AAPL,MSFT,IDX_SPY
2024-01-02,185.64,370.87,472.65
2024-01-03,184.25,,468.79
2024-01-04 00:00:00,181.91,367.94,NaN
";

    #[test]
    fn reads_sample() {
        let t = read_table_from(SAMPLE.as_bytes()).unwrap();
        assert_eq!(t.index_name(), "Date");
        assert_eq!(t.column_names(), vec!["AAPL", "MSFT", "IDX_SPY"]);
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.dates()[2], NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(t.get("MSFT", 1), None);
        assert_eq!(t.get("IDX_SPY", 2), None);
        assert_eq!(t.get("AAPL", 0), Some(185.64));
        assert!(t.columns().iter().all(|c| c.provenance == Provenance::Raw));
    }

    #[test]
    fn write_then_read_preserves_values() {
        let t = read_table_from(SAMPLE.as_bytes()).unwrap();
        let mut buf = Vec::new();
        write_table_to(&t, &mut buf).unwrap();
        let back = read_table_from(buf.as_slice()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn writes_missing_as_empty_and_dates_as_iso() {
        let t = read_table_from(SAMPLE.as_bytes()).unwrap();
        let mut buf = Vec::new();
        write_table_to(&t, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Date,AAPL,MSFT,IDX_SPY");
        assert_eq!(lines[2], "2024-01-03,184.25,,468.79");
        assert_eq!(lines[3], "2024-01-04,181.91,367.94,");
    }

    #[test]
    fn non_numeric_cell_names_row_and_column() {
        let input = "Date,A,B\n2024-01-02,1.0,2.0\n2024-01-03,1.5,abc\n";
        match read_table_from(input.as_bytes()).unwrap_err() {
            CsvError::NonNumeric { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "B");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn infinite_cell_is_rejected() {
        for token in ["inf", "-inf", "infinity", "+Infinity"] {
            let input = format!("Date,A\n2024-01-02,1.0\n2024-01-03,{token}\n");
            match read_table_from(input.as_bytes()).unwrap_err() {
                CsvError::NonNumeric { row, column, value } => {
                    assert_eq!(row, 2);
                    assert_eq!(column, "A");
                    assert_eq!(value, token);
                }
                other => panic!("unexpected error for {token}: {other}"),
            }
        }
    }

    #[test]
    fn rejects_non_monotonic_dates() {
        let input = "Date,A\n2024-01-03,1.0\n2024-01-02,2.0\n";
        assert!(matches!(
            read_table_from(input.as_bytes()).unwrap_err(),
            CsvError::NonMonotonicDates { row: 2, .. }
        ));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let input = "Date,A\n2024-01-02,1.0\n2024-01-02,2.0\n";
        assert!(read_table_from(input.as_bytes()).is_err());
    }

    #[test]
    fn rejects_duplicate_columns() {
        let input = "Date,A,A\n2024-01-02,1.0,2.0\n";
        assert!(matches!(
            read_table_from(input.as_bytes()).unwrap_err(),
            CsvError::DuplicateColumn(name) if name == "A"
        ));
    }

    #[test]
    fn rejects_bad_date() {
        let input = "Date,A\nyesterday,1.0\n";
        assert!(matches!(
            read_table_from(input.as_bytes()).unwrap_err(),
            CsvError::BadDate { row: 1, .. }
        ));
    }

    #[test]
    fn ragged_row_is_an_error() {
        let input = "Date,A,B\n2024-01-02,1.0\n";
        assert!(matches!(
            read_table_from(input.as_bytes()).unwrap_err(),
            CsvError::Csv(_)
        ));
    }

    #[test]
    fn parse_date_variants() {
        let d = NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
        assert_eq!(parse_date("2015-01-02"), Some(d));
        assert_eq!(parse_date("2015-01-02 00:00:00-05:00"), Some(d));
        assert_eq!(parse_date("2015-01-02T00:00:00"), Some(d));
        assert_eq!(parse_date("2015-01-02x"), None);
        assert_eq!(parse_date("01/02/2015"), None);
    }
}
