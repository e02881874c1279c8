//! Broad-market vs volatility-index regime features.
//!
//! Needs both designated columns (by default `IDX_SPY` and `IDX_^VIX`);
//! when either is absent the table is returned unchanged.

use crate::config::FeatureConfig;
use crate::indicators::{pct_change, rolling_corr};
use crate::table::{Column, Provenance, Table, TableError};
use tracing::debug;

pub const SPY_TREND: &str = "SPY_TREND";
pub const VIX_TREND: &str = "VIX_TREND";
pub const SPY_VIX_RATIO: &str = "SPY_VIX_RATIO";

/// Name of the rolling correlation column for a given window.
pub fn correlation_column(window: usize) -> String {
    format!("SPY_VIX_CORR_{window}")
}

pub fn add_regime_features(table: &Table, config: &FeatureConfig) -> Result<Table, TableError> {
    let (Some(broad), Some(vol)) = (
        table.values(&config.broad_market_column),
        table.values(&config.volatility_column),
    ) else {
        debug!(
            broad = %config.broad_market_column,
            volatility = %config.volatility_column,
            "regime columns not present, skipping regime features"
        );
        return Ok(table.clone());
    };

    let ratio: Vec<Option<f64>> = broad
        .iter()
        .zip(vol)
        .map(|(b, v)| match (b, v) {
            (Some(b), Some(v)) if *v != 0.0 => Some(b / v),
            _ => None,
        })
        .collect();

    table.with_columns(vec![
        Column::new(
            SPY_TREND,
            Provenance::Regime,
            pct_change(broad, config.broad_trend_horizon),
        ),
        Column::new(
            VIX_TREND,
            Provenance::Regime,
            pct_change(vol, config.volatility_trend_horizon),
        ),
        Column::new(SPY_VIX_RATIO, Provenance::Regime, ratio),
        Column::new(
            correlation_column(config.correlation_window),
            Provenance::Regime,
            rolling_corr(broad, vol, config.correlation_window),
        ),
    ])
}
