//! Relative Strength Index (RSI), simple-average variant.
//!
//! gain = rolling mean of positive one-step differences (others count as 0)
//! loss = rolling mean of |negative| one-step differences (others count as 0)
//! RSI  = 100 - 100 / (1 + gain / loss)
//!
//! Lookback: period (the first difference is missing).
//! Edge case: loss == 0 → RSI = 100, including the flat gain == loss == 0
//! window. The output never leaves [0, 100].

use super::momentum::diff;
use super::rolling::rolling_mean;
use super::Indicator;

pub fn rsi(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let changes = diff(values);
    let gains: Vec<Option<f64>> = changes.iter().map(|c| c.map(|d| d.max(0.0))).collect();
    let losses: Vec<Option<f64>> = changes
        .iter()
        .map(|c| c.map(|d| (-d).max(0.0)))
        .collect();

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(g, l)| Some(compute_rsi(g?, l?)))
        .collect()
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        100.0
    } else {
        (100.0 - 100.0 / (1.0 + avg_gain / avg_loss)).clamp(0.0, 100.0)
    }
}

/// RSI, column suffix `RSI_{period}`.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("RSI_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        rsi(values, self.period)
    }
}
