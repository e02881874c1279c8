//! Wide close-price tables from a data provider.
//!
//! Tickers become one column each; index symbols are prefixed with `IDX_` so
//! later stages can tell them apart from tradable assets.

use super::align::align_closes;
use super::provider::{DataError, DataProvider, RawBar};
use crate::classify::INDEX_PREFIX;
use crate::table::Table;
use chrono::{Duration, NaiveDate};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Name of the date index on fetched tables.
pub const DATE_INDEX: &str = "Date";

/// Start date `lookback_years` of 365 days before `today`.
pub fn default_start(lookback_years: u32, today: NaiveDate) -> NaiveDate {
    today - Duration::days(365 * i64::from(lookback_years))
}

pub struct MarketDataFetcher<P: DataProvider> {
    provider: P,
}

impl<P: DataProvider> MarketDataFetcher<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Close prices of `tickers`, one column per ticker.
    pub fn fetch(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Table, DataError> {
        let series = self.download(tickers, start, end, "")?;
        to_table(&series)
    }

    /// Close prices of index symbols, columns named `IDX_{symbol}`.
    pub fn fetch_indices(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Table, DataError> {
        let series = self.download(symbols, start, end, INDEX_PREFIX)?;
        to_table(&series)
    }

    /// Tickers and indices merged on the union of their dates. Rows where
    /// every column is missing are removed; partial rows are kept.
    pub fn fetch_combined(
        &self,
        tickers: &[String],
        indices: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Table, DataError> {
        let mut series = self.download(tickers, start, end, "")?;
        series.extend(self.download(indices, start, end, INDEX_PREFIX)?);

        let table = to_table(&series)?.drop_empty_rows();
        info!(
            provider = self.provider.name(),
            rows = table.n_rows(),
            columns = table.n_cols(),
            %start,
            %end,
            "fetched combined dataset"
        );
        Ok(table)
    }

    /// Bars per symbol, keyed by `prefix` + symbol. Unknown symbols are
    /// skipped with a warning; any other provider error aborts the fetch.
    fn download(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
        prefix: &str,
    ) -> Result<Vec<(String, Vec<RawBar>)>, DataError> {
        let mut seen = HashSet::new();
        let mut series = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(DataError::DuplicateSymbol {
                    symbol: symbol.clone(),
                });
            }
            match self.provider.fetch(symbol, start, end) {
                Ok(result) => {
                    debug!(symbol = %symbol, bars = result.bars.len(), "downloaded");
                    series.push((format!("{prefix}{symbol}"), result.bars));
                }
                Err(DataError::SymbolNotFound { symbol }) => {
                    warn!(%symbol, provider = self.provider.name(), "symbol not found, skipping");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(series)
    }
}

fn to_table(series: &[(String, Vec<RawBar>)]) -> Result<Table, DataError> {
    align_closes(DATE_INDEX, series).map_err(|e| DataError::Other(format!("alignment: {e}")))
}
