//! Per-asset indicator expansion.
//!
//! Every asset column gets one derived column per configured indicator,
//! named `{asset}_{indicator}`. Index columns and derived columns are left
//! alone. A derived column that already exists is never recomputed or
//! overwritten, so expanding an expanded table returns it unchanged.

use crate::classify::{asset_columns, derived_name};
use crate::config::FeatureConfig;
use crate::indicators::{Indicator, PctChange, Rsi, RollingStd, Sma};
use crate::table::{Column, Provenance, Table, TableError};
use rayon::prelude::*;
use tracing::debug;

/// The per-asset indicator set, in output column order:
/// moving averages, volatility, momentum, RSI.
pub fn indicator_set(config: &FeatureConfig) -> Vec<Box<dyn Indicator>> {
    let mut indicators: Vec<Box<dyn Indicator>> = config
        .ma_windows
        .iter()
        .map(|&w| Box::new(Sma::new(w)) as Box<dyn Indicator>)
        .collect();
    indicators.push(Box::new(RollingStd::new(config.volatility_window)));
    indicators.push(Box::new(PctChange::new(config.momentum_horizon)));
    indicators.push(Box::new(Rsi::new(config.rsi_period)));
    indicators
}

/// Longest lookback across an indicator set: rows before this index can
/// never be complete.
pub fn compute_warmup(indicators: &[Box<dyn Indicator>]) -> usize {
    indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
}

/// Append the indicator columns for every asset column of `table`.
///
/// Output order is the input columns followed by, for each asset in table
/// order, its indicators in `indicator_set` order. With `config.parallel`
/// the assets are computed on the rayon pool; the order is the same.
pub fn expand_indicators(table: &Table, config: &FeatureConfig) -> Result<Table, TableError> {
    let indicators = indicator_set(config);
    let assets = asset_columns(table);

    let compute = |asset: &&str| -> Vec<Column> {
        let values = table.values(asset).unwrap_or_default();
        indicators
            .iter()
            .filter(|ind| !table.has_column(&derived_name(asset, ind.name())))
            .map(|ind| {
                let series = ind.compute(values);
                debug_assert_eq!(
                    series.len(),
                    values.len(),
                    "indicator '{}' produced {} values for {} rows (asset={asset})",
                    ind.name(),
                    series.len(),
                    values.len(),
                );
                Column::new(derived_name(asset, ind.name()), Provenance::Indicator, series)
            })
            .collect()
    };

    // Indexed parallel collect keeps asset order.
    let per_asset: Vec<Vec<Column>> = if config.parallel {
        assets.par_iter().map(compute).collect()
    } else {
        assets.iter().map(compute).collect()
    };

    let derived: Vec<Column> = per_asset.into_iter().flatten().collect();
    debug!(
        assets = assets.len(),
        columns = derived.len(),
        "expanded per-asset indicators"
    );
    table.with_columns(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ramp_table(n: usize, names: &[&str]) -> Table {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates = (0..n)
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect();
        let columns = names
            .iter()
            .enumerate()
            .map(|(k, name)| {
                let values: Vec<f64> = (0..n).map(|i| 100.0 + (k + 1) as f64 * i as f64).collect();
                Column::raw(*name, &values)
            })
            .collect();
        Table::from_columns("Date", dates, columns).unwrap()
    }

    #[test]
    fn eight_columns_per_asset_in_order() {
        let t = ramp_table(30, &["AAPL"]);
        let out = expand_indicators(&t, &FeatureConfig::default()).unwrap();
        assert_eq!(
            out.column_names(),
            vec![
                "AAPL",
                "AAPL_MA_5",
                "AAPL_MA_10",
                "AAPL_MA_20",
                "AAPL_MA_50",
                "AAPL_MA_200",
                "AAPL_VOLATILITY_20",
                "AAPL_MOM_20",
                "AAPL_RSI_14",
            ]
        );
        assert!(out
            .columns()
            .iter()
            .skip(1)
            .all(|c| c.provenance == Provenance::Indicator));
    }

    #[test]
    fn skips_index_and_derived_columns() {
        let t = ramp_table(10, &["IDX_SPY", "MSFT_OLD"]);
        let out = expand_indicators(&t, &FeatureConfig::default()).unwrap();
        assert_eq!(out.n_cols(), 2);
    }

    #[test]
    fn existing_derived_column_is_not_overwritten() {
        let t = ramp_table(10, &["AAPL", "AAPL_MA_5"]);
        let out = expand_indicators(&t, &FeatureConfig::default()).unwrap();
        // 2 input columns + 7 new ones; AAPL_MA_5 keeps its original values
        assert_eq!(out.n_cols(), 9);
        assert_eq!(out.values("AAPL_MA_5"), t.values("AAPL_MA_5"));
        assert_eq!(
            out.column_names().iter().filter(|n| **n == "AAPL_MA_5").count(),
            1
        );
    }

    #[test]
    fn expanding_twice_is_a_no_op() {
        let t = ramp_table(40, &["A", "B"]);
        let once = expand_indicators(&t, &FeatureConfig::default()).unwrap();
        let twice = expand_indicators(&once, &FeatureConfig::default()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let t = ramp_table(260, &["A", "B", "C", "D"]);
        let seq = expand_indicators(
            &t,
            &FeatureConfig {
                parallel: false,
                ..FeatureConfig::default()
            },
        )
        .unwrap();
        let par = expand_indicators(&t, &FeatureConfig::default()).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn input_table_is_unchanged() {
        let t = ramp_table(30, &["A"]);
        let snapshot = t.clone();
        let _ = expand_indicators(&t, &FeatureConfig::default()).unwrap();
        assert_eq!(t, snapshot);
    }

    #[test]
    fn warmup_is_longest_lookback() {
        let set = indicator_set(&FeatureConfig::default());
        assert_eq!(set.len(), 8);
        assert_eq!(compute_warmup(&set), 199);
    }
}
