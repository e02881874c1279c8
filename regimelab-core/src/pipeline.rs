//! Feature pipeline orchestration.
//!
//! raw table → per-asset indicators → market aggregates → regime features
//! → drop every row with a missing value.
//!
//! The input is validated once at the boundary; a malformed table fails the
//! run before any stage executes.

use crate::config::{ConfigError, FeatureConfig};
use crate::features::{add_market_features, add_regime_features, expand_indicators};
use crate::table::{Table, TableError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, info_span};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input table: {0}")]
    InvalidInput(#[source] TableError),

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: TableError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Shape bookkeeping for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub columns_in: usize,
    pub indicator_columns: usize,
    pub market_columns: usize,
    pub regime_columns: usize,
}

impl PipelineReport {
    pub fn rows_dropped(&self) -> usize {
        self.rows_in - self.rows_out
    }

    pub fn columns_out(&self) -> usize {
        self.columns_in + self.indicator_columns + self.market_columns + self.regime_columns
    }
}

/// Runs the feature stages in order over a whole price history.
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    pub fn new(config: FeatureConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Raw price table in, dense feature table out.
    pub fn process(&self, table: &Table) -> Result<Table, PipelineError> {
        self.process_with_report(table).map(|(t, _)| t)
    }

    /// All stages without the final completeness filter.
    pub fn build_features(&self, table: &Table) -> Result<(Table, PipelineReport), PipelineError> {
        table.validate().map_err(PipelineError::InvalidInput)?;

        let mut report = PipelineReport {
            rows_in: table.n_rows(),
            columns_in: table.n_cols(),
            ..PipelineReport::default()
        };

        let indicators = {
            let _span = info_span!("indicators").entered();
            expand_indicators(table, &self.config).map_err(|source| PipelineError::Stage {
                stage: "indicators",
                source,
            })?
        };
        report.indicator_columns = indicators.n_cols() - table.n_cols();

        let market = {
            let _span = info_span!("market").entered();
            add_market_features(&indicators, &self.config).map_err(|source| {
                PipelineError::Stage {
                    stage: "market",
                    source,
                }
            })?
        };
        report.market_columns = market.n_cols() - indicators.n_cols();

        let regime = {
            let _span = info_span!("regime").entered();
            add_regime_features(&market, &self.config).map_err(|source| PipelineError::Stage {
                stage: "regime",
                source,
            })?
        };
        report.regime_columns = regime.n_cols() - market.n_cols();

        Ok((regime, report))
    }

    /// Full run, returning the dense table and what each stage contributed.
    pub fn process_with_report(
        &self,
        table: &Table,
    ) -> Result<(Table, PipelineReport), PipelineError> {
        info!(
            rows = table.n_rows(),
            columns = table.n_cols(),
            "processing price table"
        );

        let (full, mut report) = self.build_features(table)?;
        let dense = full.drop_incomplete_rows();
        report.rows_out = dense.n_rows();

        info!(
            indicators = report.indicator_columns,
            market = report.market_columns,
            regime = report.regime_columns,
            rows_out = report.rows_out,
            rows_dropped = report.rows_dropped(),
            "feature table ready"
        );
        Ok((dense, report))
    }
}
