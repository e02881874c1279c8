//! Table fingerprints and the run manifest written next to each output.
//!
//! A fingerprint is the BLAKE3 hash of the index name, the dates, the column
//! names and the bit patterns of every value (missing hashes differently from
//! any number), so two tables fingerprint equal exactly when they would
//! serialize identically.

use crate::config::FeatureConfig;
use crate::data::write_atomic;
use crate::pipeline::PipelineReport;
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Hex-encoded BLAKE3 hash of a table's contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableHash(pub String);

impl fmt::Display for TableHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn fingerprint_table(table: &Table) -> TableHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(table.index_name().as_bytes());
    hasher.update(&(table.n_rows() as u64).to_le_bytes());
    for date in table.dates() {
        hasher.update(date.to_string().as_bytes());
    }
    for column in table.columns() {
        hasher.update(&(column.name.len() as u64).to_le_bytes());
        hasher.update(column.name.as_bytes());
        for value in &column.values {
            match value {
                Some(v) => {
                    hasher.update(&[1]);
                    hasher.update(&v.to_bits().to_le_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }
    }
    TableHash(hasher.finalize().to_hex().to_string())
}

/// Sidecar record of one feature run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub input_hash: TableHash,
    pub output_hash: TableHash,
    pub rows_in: usize,
    pub rows_out: usize,
    pub rows_dropped: usize,
    pub columns_out: usize,
    pub report: PipelineReport,
    pub config: FeatureConfig,
    pub created_at: DateTime<Utc>,
}

impl RunManifest {
    pub fn new(
        input: &Table,
        output: &Table,
        report: &PipelineReport,
        config: &FeatureConfig,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            input_hash: fingerprint_table(input),
            output_hash: fingerprint_table(output),
            rows_in: input.n_rows(),
            rows_out: output.n_rows(),
            rows_dropped: input.n_rows().saturating_sub(output.n_rows()),
            columns_out: output.n_cols(),
            report: report.clone(),
            config: config.clone(),
            created_at,
        }
    }

    /// `<output>.meta.json` next to the output file.
    pub fn path_for(output: &Path) -> PathBuf {
        let mut name = output.file_name().unwrap_or_default().to_os_string();
        name.push(".meta.json");
        output.with_file_name(name)
    }

    pub fn write(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &json)
    }

    pub fn read(path: &Path) -> io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
