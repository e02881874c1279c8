//! RegimeLab Core: feature engineering for market-regime detection.
//!
//! Turns a wide table of daily closes into a dense feature table:
//! - Table model with explicit missing values and column provenance
//! - Column classification (asset / index / derived)
//! - Rolling indicator library (MA, volatility, momentum, RSI, correlation)
//! - Per-asset indicator expansion, cross-sectional market aggregates,
//!   broad-market vs volatility-index regime features
//! - Acquisition (Yahoo Finance, synthetic), CSV/Parquet I/O, run manifests

pub mod classify;
pub mod config;
pub mod data;
pub mod features;
pub mod fingerprint;
pub mod indicators;
pub mod pipeline;
pub mod table;

pub use classify::{classify, ColumnClass};
pub use config::{ConfigError, FeatureConfig, RunConfig};
pub use pipeline::{FeatureEngineer, PipelineError, PipelineReport};
pub use table::{Column, Provenance, Table, TableError};
