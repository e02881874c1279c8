//! End-to-end pipeline tests on small synthetic price tables.

use chrono::NaiveDate;
use regimelab_core::data::{read_table_from, write_table_to};
use regimelab_core::features::{MARKET_PERCENT_ABOVE_MA, SPY_TREND};
use regimelab_core::{Column, FeatureConfig, FeatureEngineer, Table};

fn dates(n: usize) -> Vec<NaiveDate> {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (0..n)
        .map(|i| base + chrono::Duration::days(i as i64))
        .collect()
}

/// A: linear ramp, B: sine wave, IDX_X: constant.
fn ramp_sine_constant(n: usize) -> Table {
    let a: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
    let b: Vec<f64> = (0..n).map(|i| 100.0 + 10.0 * (i as f64 * 0.1).sin()).collect();
    let x = vec![50.0; n];
    Table::from_columns(
        "Date",
        dates(n),
        vec![
            Column::raw("A", &a),
            Column::raw("B", &b),
            Column::raw("IDX_X", &x),
        ],
    )
    .unwrap()
}

fn to_csv(table: &Table) -> Vec<u8> {
    let mut buf = Vec::new();
    write_table_to(table, &mut buf).unwrap();
    buf
}

#[test]
fn two_assets_and_one_index() {
    let input = ramp_sine_constant(250);
    let out = FeatureEngineer::default().process(&input).unwrap();

    let mut expected = vec!["A", "B", "IDX_X"]
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    for asset in ["A", "B"] {
        for suffix in [
            "MA_5",
            "MA_10",
            "MA_20",
            "MA_50",
            "MA_200",
            "VOLATILITY_20",
            "MOM_20",
            "RSI_14",
        ] {
            expected.push(format!("{asset}_{suffix}"));
        }
    }
    expected.extend(
        ["MARKET_MEAN_RETURN", "MARKET_VOLATILITY", "MARKET_PERCENT_ABOVE_MA"]
            .map(String::from),
    );

    assert_eq!(out.column_names(), expected);
    assert!(!out.has_column("IDX_X_MA_5"));
    assert!(!out.has_column(SPY_TREND));

    // MA_200 needs 199 rows of history
    assert_eq!(out.n_rows(), 51);
    assert_eq!(out.dates()[0], dates(250)[199]);
    assert!((0..out.n_rows()).all(|r| out.row_is_complete(r)));
}

#[test]
fn breadth_is_missing_before_the_breadth_window() {
    let input = ramp_sine_constant(250);
    let (full, _) = FeatureEngineer::default().build_features(&input).unwrap();

    let breadth = full.values(MARKET_PERCENT_ABOVE_MA).unwrap();
    assert!(breadth[..49].iter().all(|v| v.is_none()));
    assert!(breadth[49..].iter().all(|v| v.is_some()));
    // the ramp is always above its own MA_50
    assert!(breadth[49..].iter().flatten().all(|v| *v >= 50.0));
}

#[test]
fn ramp_rsi_saturates() {
    let out = FeatureEngineer::default()
        .process(&ramp_sine_constant(250))
        .unwrap();
    assert!(out.values("A_RSI_14").unwrap().iter().all(|v| *v == Some(100.0)));
}

#[test]
fn output_is_byte_identical_across_runs() {
    let input = ramp_sine_constant(250);
    let first = to_csv(&FeatureEngineer::default().process(&input).unwrap());
    let second = to_csv(&FeatureEngineer::default().process(&input).unwrap());
    assert_eq!(first, second);

    let sequential = FeatureEngineer::new(FeatureConfig {
        parallel: false,
        ..FeatureConfig::default()
    })
    .unwrap();
    assert_eq!(to_csv(&sequential.process(&input).unwrap()), first);
}

#[test]
fn csv_in_csv_out() {
    let input = to_csv(&ramp_sine_constant(220));
    let table = read_table_from(input.as_slice()).unwrap();
    let out = FeatureEngineer::default().process(&table).unwrap();
    assert_eq!(out.n_rows(), 21);

    // written output reads back to the same values
    let reread = read_table_from(to_csv(&out).as_slice()).unwrap();
    assert_eq!(reread.column_names(), out.column_names());
    for (a, b) in reread.columns().iter().zip(out.columns()) {
        assert_eq!(a.values, b.values, "column {}", a.name);
    }
}

#[test]
fn regime_features_with_spy_and_vix() {
    let n = 240;
    let mut input = ramp_sine_constant(n);
    let spy: Vec<f64> = (0..n).map(|i| 300.0 + i as f64 * 0.5).collect();
    let vix: Vec<f64> = (0..n).map(|i| 20.0 + 3.0 * (i as f64 * 0.3).cos()).collect();
    input = input
        .with_columns(vec![Column::raw("IDX_SPY", &spy), Column::raw("IDX_^VIX", &vix)])
        .unwrap();

    let (out, report) = FeatureEngineer::default().process_with_report(&input).unwrap();
    assert_eq!(report.regime_columns, 4);
    for name in ["SPY_TREND", "VIX_TREND", "SPY_VIX_RATIO", "SPY_VIX_CORR_20"] {
        assert!(out.has_column(name), "missing {name}");
    }
    assert!(out
        .values("SPY_VIX_CORR_20")
        .unwrap()
        .iter()
        .flatten()
        .all(|c| (-1.0..=1.0).contains(c)));
}

#[test]
fn malformed_input_fails_before_any_stage() {
    let mut d = dates(3);
    d.swap(0, 1);
    let bad = Table::new("Date", d);
    let err = FeatureEngineer::default().process(&bad).unwrap_err();
    assert!(err.to_string().contains("invalid input table"));
}
