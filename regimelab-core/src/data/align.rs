//! Multi-symbol time alignment.
//!
//! Bars from several symbols are laid out on the union of their dates. A
//! symbol without a bar on a date gets a missing value there; nothing is
//! forward-filled.

use super::provider::RawBar;
use crate::table::{Column, Provenance, Table, TableError};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Align the adjusted close of each symbol into a wide table.
///
/// Columns keep the order of `series`; `name` of each pair becomes the
/// column name. Non-finite closes are stored as missing.
pub fn align_closes(
    index_name: &str,
    series: &[(String, Vec<RawBar>)],
) -> Result<Table, TableError> {
    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|(_, bars)| bars.iter().map(|b| b.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let columns = series
        .iter()
        .map(|(name, bars)| {
            let by_date: HashMap<NaiveDate, f64> =
                bars.iter().map(|b| (b.date, b.adj_close)).collect();
            let values = dates.iter().map(|d| by_date.get(d).copied()).collect();
            Column::new(name.clone(), Provenance::Raw, values)
        })
        .collect();

    Table::from_columns(index_name, dates, columns)
}
