//! Data acquisition and persistence.
//!
//! Providers return daily bars per symbol; the fetcher aligns them into wide
//! close-price tables. Tables are persisted as CSV (and optionally Parquet)
//! with atomic writes.

pub mod acquisition;
pub mod align;
pub mod csv_io;
pub mod parquet;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use acquisition::{default_start, MarketDataFetcher};
pub use align::align_closes;
pub use csv_io::{read_table, read_table_from, write_table, write_table_to, CsvError};
pub use parquet::write_parquet;
pub use provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write `bytes` to `path` via a sibling `.tmp` file and a rename, creating
/// parent directories as needed. On failure the temp file is removed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(path);
    let result = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_parents_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/file.csv");
        write_atomic(&path, b"a,b\n").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"a,b\n");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.csv");
        write_atomic(&path, b"old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // target is an existing directory, so the rename fails
        let path = dir.path().join("taken");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("inner"), b"x").unwrap();

        assert!(write_atomic(&path, b"data").is_err());
        assert!(!tmp_path(&path).exists());
    }
}
