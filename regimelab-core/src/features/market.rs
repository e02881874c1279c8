//! Cross-sectional market statistics.
//!
//! Per row, over the asset columns only:
//! - `MARKET_MEAN_RETURN`: mean of the per-asset returns present at t
//! - `MARKET_VOLATILITY`: sample std of the same returns
//! - `MARKET_PERCENT_ABOVE_MA`: share (0-100) of assets trading above their
//!   own breadth moving average, over the assets whose MA is present at t
//!
//! Returns are recomputed here from the raw asset prices, so the stage only
//! depends on the expander for the breadth moving average.

use crate::classify::{asset_columns, derived_name};
use crate::config::FeatureConfig;
use crate::indicators::pct_change;
use crate::table::{Column, Provenance, Table, TableError};
use tracing::debug;

pub const MARKET_MEAN_RETURN: &str = "MARKET_MEAN_RETURN";
pub const MARKET_VOLATILITY: &str = "MARKET_VOLATILITY";
pub const MARKET_PERCENT_ABOVE_MA: &str = "MARKET_PERCENT_ABOVE_MA";

/// Append the market aggregate columns.
///
/// With no asset columns the table is returned unchanged. The breadth column
/// is omitted when no asset has a breadth moving-average column.
pub fn add_market_features(table: &Table, config: &FeatureConfig) -> Result<Table, TableError> {
    let assets = asset_columns(table);
    if assets.is_empty() {
        debug!("no asset columns, skipping market aggregates");
        return Ok(table.clone());
    }

    let n = table.n_rows();
    let returns: Vec<Vec<Option<f64>>> = assets
        .iter()
        .map(|a| pct_change(table.values(a).unwrap_or_default(), config.return_horizon))
        .collect();

    let mut mean = Vec::with_capacity(n);
    let mut dispersion = Vec::with_capacity(n);
    let mut row = Vec::with_capacity(assets.len());
    for t in 0..n {
        row.clear();
        row.extend(returns.iter().filter_map(|r| r[t]));
        mean.push(cross_mean(&row));
        dispersion.push(cross_std(&row));
    }

    let mut columns = vec![
        Column::new(MARKET_MEAN_RETURN, Provenance::MarketAggregate, mean),
        Column::new(MARKET_VOLATILITY, Provenance::MarketAggregate, dispersion),
    ];

    match breadth(table, &assets, config.breadth_window) {
        Some(values) => columns.push(Column::new(
            MARKET_PERCENT_ABOVE_MA,
            Provenance::MarketAggregate,
            values,
        )),
        None => debug!(
            window = config.breadth_window,
            "no asset has a breadth moving average, omitting {MARKET_PERCENT_ABOVE_MA}"
        ),
    }

    table.with_columns(columns)
}

/// Percentage of assets above their moving average, per row.
///
/// `None` overall when no asset has the MA column; `None` at a row when no
/// asset has both a price and an MA value there.
fn breadth(table: &Table, assets: &[&str], window: usize) -> Option<Vec<Option<f64>>> {
    let ma_suffix = format!("MA_{window}");
    let pairs: Vec<(&[Option<f64>], &[Option<f64>])> = assets
        .iter()
        .filter_map(|a| {
            let price = table.values(a)?;
            let ma = table.values(&derived_name(a, &ma_suffix))?;
            Some((price, ma))
        })
        .collect();

    if pairs.is_empty() {
        return None;
    }

    let values = (0..table.n_rows())
        .map(|t| {
            let mut qualifying = 0usize;
            let mut above = 0usize;
            for (price, ma) in &pairs {
                if let (Some(p), Some(m)) = (price[t], ma[t]) {
                    qualifying += 1;
                    if p > m {
                        above += 1;
                    }
                }
            }
            (qualifying > 0).then(|| above as f64 / qualifying as f64 * 100.0)
        })
        .collect();
    Some(values)
}

fn cross_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample std (ddof = 1); needs at least two observations.
fn cross_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = cross_mean(values)?;
    let ss: f64 = values.iter().map(|x| (x - mean) * (x - mean)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}
