//! Indicator library.
//!
//! Pure functions over a single optional-valued series. Every output has the
//! same length as its input; positions without enough history are `None`.
//! A window that contains a missing value produces `None` rather than a
//! partial statistic.
//!
//! The `Indicator` trait wraps the parameterised functions so the per-asset
//! expander can treat them uniformly and name their output columns.

pub mod correlation;
pub mod momentum;
pub mod rolling;
pub mod rsi;

pub use correlation::rolling_corr;
pub use momentum::{diff, pct_change, PctChange};
pub use rolling::{rolling_mean, rolling_std, RollingStd, Sma};
pub use rsi::{rsi, Rsi};

/// A single-series indicator.
///
/// # Look-ahead guard
/// No output at index t may depend on input at t+1 or later.
pub trait Indicator: Send + Sync {
    /// Column suffix, e.g. "MA_50" or "RSI_14".
    fn name(&self) -> &str;

    /// Number of leading outputs that are always `None` on a gap-free input.
    fn lookback(&self) -> usize;

    /// Compute over the full series.
    fn compute(&self, values: &[Option<f64>]) -> Vec<Option<f64>>;
}

/// Wrap plain floats, treating NaN as missing.
#[cfg(test)]
pub fn series(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|&v| if v.is_nan() { None } else { Some(v) })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
