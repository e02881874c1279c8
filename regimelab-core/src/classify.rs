//! Column classification.
//!
//! Every stage decides what to work on by asking `classify` once per column.
//! Provenance is authoritative for columns this crate produced; the naming
//! rule (reserved `IDX_` prefix, `_` separator) covers raw files that already
//! contain derived columns from an earlier run.

use crate::table::{Provenance, Table};

/// Reserved prefix marking market/index columns.
pub const INDEX_PREFIX: &str = "IDX_";

/// Separator between a source column and its indicator suffix.
pub const SEPARATOR: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnClass {
    /// Price series of one tradable asset.
    Asset,
    /// Market benchmark or index level.
    Index,
    /// Anything computed from other columns.
    Derived,
}

pub fn classify(name: &str, provenance: Provenance) -> ColumnClass {
    if name.starts_with(INDEX_PREFIX) {
        ColumnClass::Index
    } else if provenance != Provenance::Raw || name.contains(SEPARATOR) {
        ColumnClass::Derived
    } else {
        ColumnClass::Asset
    }
}

/// Names of the asset columns of `table`, in table order.
pub fn asset_columns(table: &Table) -> Vec<&str> {
    table
        .columns()
        .iter()
        .filter(|c| classify(&c.name, c.provenance) == ColumnClass::Asset)
        .map(|c| c.name.as_str())
        .collect()
}

/// Name of the derived column `{source}_{suffix}`.
pub fn derived_name(source: &str, suffix: &str) -> String {
    format!("{source}{SEPARATOR}{suffix}")
}
