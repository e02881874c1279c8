//! RegimeLab CLI: fetch prices and build regime feature tables.
//!
//! Commands:
//! - `fetch`: download close prices (Yahoo Finance or synthetic) to CSV
//! - `features`: turn a raw price CSV into a dense feature table
//! - `pipeline`: `fetch` followed by `features`

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use regimelab_core::data::{
    default_start, read_table, write_parquet, write_table, DataProvider, MarketDataFetcher,
    SyntheticProvider, YahooProvider,
};
use regimelab_core::fingerprint::RunManifest;
use regimelab_core::{FeatureEngineer, RunConfig, Table};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "regimelab",
    about = "RegimeLab CLI: market-regime feature engineering"
)]
struct Cli {
    /// Path to a TOML run config. Flags override values from the file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download close prices for tickers and indices into a wide CSV.
    Fetch(FetchArgs),
    /// Compute the feature table from a raw price CSV.
    Features {
        /// Raw price CSV. Defaults to {raw_dir}/market_data.csv.
        #[arg(long)]
        input_path: Option<PathBuf>,

        #[command(flatten)]
        output: FeatureOutputArgs,
    },
    /// Fetch, then compute features from the fetched data.
    Pipeline {
        #[command(flatten)]
        fetch: FetchArgs,

        #[command(flatten)]
        output: FeatureOutputArgs,
    },
}

#[derive(Args)]
struct FetchArgs {
    /// Stock tickers, comma separated (e.g. AAPL,MSFT).
    #[arg(long, value_delimiter = ',')]
    tickers: Option<Vec<String>>,

    /// Index symbols, comma separated (e.g. SPY,^VIX). Stored as IDX_{symbol}.
    #[arg(long, value_delimiter = ',')]
    indices: Option<Vec<String>>,

    /// Years of history when --start is not given.
    #[arg(long)]
    lookback_years: Option<u32>,

    /// Start date (YYYY-MM-DD).
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Directory for market_data.csv.
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Use deterministic synthetic prices instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

#[derive(Args)]
struct FeatureOutputArgs {
    /// Directory for market_features.csv.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Also write market_features.parquet.
    #[arg(long, default_value_t = false)]
    parquet: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Fetch(args) => {
            apply_fetch_args(&mut config, &args);
            run_fetch(&config, args.synthetic)?;
        }
        Commands::Features { input_path, output } => {
            apply_output_args(&mut config, &output);
            let input = input_path.unwrap_or_else(|| config.output.raw_path());
            run_features(&config, &input)?;
        }
        Commands::Pipeline { fetch, output } => {
            apply_fetch_args(&mut config, &fetch);
            apply_output_args(&mut config, &output);
            let raw_path = run_fetch(&config, fetch.synthetic)?;
            run_features(&config, &raw_path)?;
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => {
            let config = RunConfig::from_file(path)?;
            info!(path = %path.display(), "loaded config");
            Ok(config)
        }
        None => Ok(RunConfig::default()),
    }
}

fn apply_fetch_args(config: &mut RunConfig, args: &FetchArgs) {
    let acq = &mut config.acquisition;
    if let Some(tickers) = &args.tickers {
        acq.tickers = tickers.clone();
    }
    if let Some(indices) = &args.indices {
        acq.indices = indices.clone();
    }
    if let Some(years) = args.lookback_years {
        acq.lookback_years = years;
    }
    if args.start.is_some() {
        acq.start = args.start;
    }
    if args.end.is_some() {
        acq.end = args.end;
    }
    if let Some(dir) = &args.raw_dir {
        config.output.raw_dir = dir.clone();
    }
}

fn apply_output_args(config: &mut RunConfig, args: &FeatureOutputArgs) {
    if let Some(dir) = &args.output_dir {
        config.output.features_dir = dir.clone();
    }
    if args.parquet {
        config.output.write_parquet = true;
    }
}

/// Download the configured universe and write the raw CSV. Returns its path.
fn run_fetch(config: &RunConfig, synthetic: bool) -> Result<PathBuf> {
    let acq = &config.acquisition;
    if acq.tickers.is_empty() && acq.indices.is_empty() {
        bail!("nothing to fetch: no tickers and no indices configured");
    }

    let today = chrono::Local::now().date_naive();
    let end = acq.end.unwrap_or(today);
    let start = acq
        .start
        .unwrap_or_else(|| default_start(acq.lookback_years, end));
    if start > end {
        bail!("start date {start} is after end date {end}");
    }

    let table = if synthetic {
        fetch_with(SyntheticProvider::default(), config, start, end)?
    } else {
        fetch_with(YahooProvider::new()?, config, start, end)?
    };
    if table.n_rows() == 0 {
        bail!("no price data returned for {start}..{end}");
    }

    let path = config.output.raw_path();
    write_table(&table, &path)?;
    println!(
        "Fetched {} rows x {} columns ({} to {}) -> {}",
        table.n_rows(),
        table.n_cols(),
        start,
        end,
        path.display()
    );
    Ok(path)
}

fn fetch_with<P: DataProvider>(
    provider: P,
    config: &RunConfig,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Table> {
    let fetcher = MarketDataFetcher::new(provider);
    let table = fetcher.fetch_combined(
        &config.acquisition.tickers,
        &config.acquisition.indices,
        start,
        end,
    )?;
    Ok(table)
}

fn run_features(config: &RunConfig, input: &Path) -> Result<()> {
    let raw = read_table(input).with_context(|| format!("reading {}", input.display()))?;
    let engineer = FeatureEngineer::new(config.features.clone())?;
    let (features, report) = engineer.process_with_report(&raw)?;

    if features.n_rows() == 0 {
        warn!(
            rows_in = report.rows_in,
            "no row has every feature present; history is shorter than the longest window"
        );
    }

    let csv_path = config.output.features_path();
    let parquet_path = csv_path.with_extension("parquet");
    let manifest_path = RunManifest::path_for(&csv_path);
    let manifest = RunManifest::new(&raw, &features, &report, engineer.config(), Utc::now());

    // All outputs or none: a failed write removes the files already written.
    let mut written: Vec<PathBuf> = Vec::new();
    let outcome = (|| -> Result<()> {
        write_table(&features, &csv_path)?;
        written.push(csv_path.clone());
        if config.output.write_parquet {
            write_parquet(&features, &parquet_path)?;
            written.push(parquet_path.clone());
        }
        manifest
            .write(&manifest_path)
            .with_context(|| format!("writing {}", manifest_path.display()))?;
        Ok(())
    })();
    if let Err(e) = outcome {
        for path in &written {
            if let Err(rm) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %rm, "could not remove partial output");
            }
        }
        return Err(e);
    }
    if config.output.write_parquet {
        println!("Parquet saved to: {}", parquet_path.display());
    }

    println!(
        "Features: {} rows x {} columns ({} rows dropped) -> {}",
        features.n_rows(),
        features.n_cols(),
        report.rows_dropped(),
        csv_path.display()
    );
    Ok(())
}
