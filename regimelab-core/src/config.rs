//! Serializable run configuration.
//!
//! A run is described by three sections, all optional in the TOML file:
//!
//! ```toml
//! [acquisition]
//! tickers = ["AAPL", "MSFT"]
//! lookback_years = 5
//!
//! [features]
//! ma_windows = [5, 10, 20, 50, 200]
//! parallel = false
//!
//! [output]
//! features_dir = "out/features"
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Parameters of the feature engineering pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeatureConfig {
    /// Moving-average windows computed for every asset.
    pub ma_windows: Vec<usize>,
    /// Window of the per-asset rolling standard deviation.
    pub volatility_window: usize,
    /// Horizon of the per-asset percent-change momentum column.
    pub momentum_horizon: usize,
    pub rsi_period: usize,
    /// Moving-average window used for market breadth.
    pub breadth_window: usize,
    /// Return horizon used for the cross-sectional market statistics.
    pub return_horizon: usize,
    pub broad_market_column: String,
    pub volatility_column: String,
    pub broad_trend_horizon: usize,
    pub volatility_trend_horizon: usize,
    pub correlation_window: usize,
    /// Compute per-asset indicators on the rayon pool.
    pub parallel: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            ma_windows: vec![5, 10, 20, 50, 200],
            volatility_window: 20,
            momentum_horizon: 20,
            rsi_period: 14,
            breadth_window: 50,
            return_horizon: 1,
            broad_market_column: "IDX_SPY".to_string(),
            volatility_column: "IDX_^VIX".to_string(),
            broad_trend_horizon: 20,
            volatility_trend_horizon: 10,
            correlation_window: 20,
            parallel: true,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ma_windows.is_empty() {
            return Err(ConfigError::Invalid("ma_windows must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for &w in &self.ma_windows {
            if w == 0 {
                return Err(ConfigError::Invalid("ma_windows must be >= 1".into()));
            }
            if !seen.insert(w) {
                return Err(ConfigError::Invalid(format!("duplicate ma window {w}")));
            }
        }

        let positive = [
            ("momentum_horizon", self.momentum_horizon),
            ("rsi_period", self.rsi_period),
            ("breadth_window", self.breadth_window),
            ("return_horizon", self.return_horizon),
            ("broad_trend_horizon", self.broad_trend_horizon),
            ("volatility_trend_horizon", self.volatility_trend_horizon),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be >= 1")));
            }
        }
        if self.volatility_window < 2 {
            return Err(ConfigError::Invalid("volatility_window must be >= 2".into()));
        }
        if self.correlation_window < 2 {
            return Err(ConfigError::Invalid("correlation_window must be >= 2".into()));
        }
        Ok(())
    }
}

/// What to download and over which period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub tickers: Vec<String>,
    pub indices: Vec<String>,
    /// Used when `start` is not set.
    pub lookback_years: u32,
    pub start: Option<NaiveDate>,
    /// Defaults to today.
    pub end: Option<NaiveDate>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            tickers: ["AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA", "TSLA"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            indices: ["SPY", "^VIX", "^TNX", "^GSPC", "QQQ"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            lookback_years: 10,
            start: None,
            end: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub raw_dir: PathBuf,
    pub features_dir: PathBuf,
    /// Also write the feature table as Parquet next to the CSV.
    pub write_parquet: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            features_dir: PathBuf::from("data/features"),
            write_parquet: false,
        }
    }
}

impl OutputConfig {
    pub fn raw_path(&self) -> PathBuf {
        self.raw_dir.join("market_data.csv")
    }

    pub fn features_path(&self) -> PathBuf {
        self.features_dir.join("market_features.csv")
    }
}

/// Complete configuration of a fetch + features run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub acquisition: AcquisitionConfig,
    pub features: FeatureConfig,
    pub output: OutputConfig,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.features.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_pipeline() {
        let c = FeatureConfig::default();
        assert_eq!(c.ma_windows, vec![5, 10, 20, 50, 200]);
        assert_eq!(c.rsi_period, 14);
        assert_eq!(c.broad_market_column, "IDX_SPY");
        assert_eq!(c.volatility_column, "IDX_^VIX");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn empty_toml_is_default() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_given_fields() {
        let config = RunConfig::from_toml(
            r#"
            [acquisition]
            tickers = ["AAPL"]
            start = "2020-01-01"

            [features]
            ma_windows = [10, 50]
            parallel = false

            [output]
            write_parquet = true
            "#,
        )
        .unwrap();

        assert_eq!(config.acquisition.tickers, vec!["AAPL"]);
        assert_eq!(
            config.acquisition.start,
            NaiveDate::from_ymd_opt(2020, 1, 1)
        );
        assert_eq!(config.acquisition.lookback_years, 10);
        assert_eq!(config.features.ma_windows, vec![10, 50]);
        assert!(!config.features.parallel);
        assert_eq!(config.features.rsi_period, 14);
        assert!(config.output.write_parquet);
        assert_eq!(config.output.raw_dir, PathBuf::from("data/raw"));
    }

    #[test]
    fn rejects_invalid_feature_params() {
        let mut c = FeatureConfig::default();
        c.ma_windows = vec![5, 5];
        assert!(c.validate().is_err());

        let mut c = FeatureConfig::default();
        c.rsi_period = 0;
        assert!(c.validate().is_err());

        let mut c = FeatureConfig::default();
        c.volatility_window = 1;
        assert!(c.validate().is_err());

        let mut c = FeatureConfig::default();
        c.ma_windows.clear();
        assert!(c.validate().is_err());
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = RunConfig::from_toml("[features]\nma_windows = \"oops\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn output_paths() {
        let out = OutputConfig::default();
        assert_eq!(out.raw_path(), PathBuf::from("data/raw/market_data.csv"));
        assert_eq!(
            out.features_path(),
            PathBuf::from("data/features/market_features.csv")
        );
    }
}
