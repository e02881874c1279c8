//! Trailing-window statistics: simple moving average and sample standard
//! deviation.
//!
//! Output at index i covers inputs `[i + 1 - window, i]`. The first valid
//! value is at index `window - 1`; a window holding any missing input is
//! missing.

use super::Indicator;

/// Rolling mean over `window` trailing values.
///
/// Each window is averaged on its own rather than through a running sum, so
/// rounding error cannot carry over from values that have left the window.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if window == 0 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        result[i] = window_mean(&values[(i + 1 - window)..=i]);
    }
    result
}

/// Rolling sample standard deviation (ddof = 1) over `window` values.
///
/// Two-pass per window (mean, then squared deviations) to avoid the
/// cancellation error of running sum-of-squares on price-level inputs.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if window < 2 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        let Some(mean) = window_mean(slice) else {
            continue;
        };
        let ss: f64 = slice
            .iter()
            .flatten()
            .map(|x| (x - mean) * (x - mean))
            .sum();
        result[i] = Some((ss / (window - 1) as f64).sqrt());
    }

    result
}

/// Mean of a slice, or `None` if any element is missing.
pub(crate) fn window_mean(slice: &[Option<f64>]) -> Option<f64> {
    // Deviations from the first value: a constant window averages to exactly
    // that value, and the result stays inside [min, max].
    let anchor = (*slice.first()?)?;
    let mut dev = 0.0;
    let mut lo = anchor;
    let mut hi = anchor;
    for v in slice {
        let x = (*v)?;
        dev += x - anchor;
        lo = lo.min(x);
        hi = hi.max(x);
    }
    Some((anchor + dev / slice.len() as f64).clamp(lo, hi))
}

/// Simple moving average, column suffix `MA_{window}`.
#[derive(Debug, Clone)]
pub struct Sma {
    window: usize,
    name: String,
}

impl Sma {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "SMA window must be >= 1");
        Self {
            window,
            name: format!("MA_{window}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        rolling_mean(values, self.window)
    }
}

/// Rolling volatility (sample std of price), column suffix `VOLATILITY_{window}`.
#[derive(Debug, Clone)]
pub struct RollingStd {
    window: usize,
    name: String,
}

impl RollingStd {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "volatility window must be >= 2");
        Self {
            window,
            name: format!("VOLATILITY_{window}"),
        }
    }
}

impl Indicator for RollingStd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        rolling_std(values, self.window)
    }
}
