//! Differences and percentage change.
//!
//! pct_change[t] = (x[t] - x[t-h]) / x[t-h]
//! Missing for the first `h` positions, when either operand is missing, and
//! when the denominator is exactly zero.

use super::Indicator;

/// Fractional change over `horizon` steps.
pub fn pct_change(values: &[Option<f64>], horizon: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if horizon == 0 {
        return result;
    }

    for i in horizon..n {
        result[i] = match (values[i - horizon], values[i]) {
            (Some(prev), Some(curr)) if prev != 0.0 => Some((curr - prev) / prev),
            _ => None,
        };
    }
    result
}

/// One-step difference x[t] - x[t-1]; the first position is missing.
pub fn diff(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    for i in 1..values.len() {
        if let (Some(prev), Some(curr)) = (values[i - 1], values[i]) {
            result[i] = Some(curr - prev);
        }
    }
    result
}

/// Momentum as percentage change, column suffix `MOM_{horizon}`.
#[derive(Debug, Clone)]
pub struct PctChange {
    horizon: usize,
    name: String,
}

impl PctChange {
    pub fn new(horizon: usize) -> Self {
        assert!(horizon >= 1, "momentum horizon must be >= 1");
        Self {
            horizon,
            name: format!("MOM_{horizon}"),
        }
    }
}

impl Indicator for PctChange {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.horizon
    }

    fn compute(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        pct_change(values, self.horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, series, DEFAULT_EPSILON};

    #[test]
    fn pct_change_horizon_1() {
        let result = pct_change(&series(&[100.0, 110.0, 121.0]), 1);
        assert!(result[0].is_none());
        assert_approx(result[1].unwrap(), 0.10, DEFAULT_EPSILON);
        assert_approx(result[2].unwrap(), 0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_horizon_5_and_20() {
        let input: Vec<Option<f64>> = (0..30).map(|i| Some(100.0 + i as f64)).collect();

        let five = pct_change(&input, 5);
        assert!(five[..5].iter().all(|v| v.is_none()));
        assert_approx(five[5].unwrap(), 5.0 / 100.0, DEFAULT_EPSILON);

        let twenty = pct_change(&input, 20);
        assert!(twenty[..20].iter().all(|v| v.is_none()));
        assert_approx(twenty[25].unwrap(), 20.0 / 105.0, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_negative() {
        let result = pct_change(&series(&[100.0, 90.0]), 1);
        assert_approx(result[1].unwrap(), -0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_missing_operand() {
        let result = pct_change(&series(&[100.0, f64::NAN, 120.0]), 1);
        assert!(result[1].is_none()); // current missing
        assert!(result[2].is_none()); // previous missing
    }

    #[test]
    fn pct_change_zero_denominator_is_missing() {
        let result = pct_change(&series(&[0.0, 5.0, 10.0]), 1);
        assert!(result[1].is_none());
        assert_approx(result[2].unwrap(), 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_horizon_longer_than_series() {
        assert!(pct_change(&series(&[1.0, 2.0]), 5)
            .iter()
            .all(|v| v.is_none()));
    }

    #[test]
    fn diff_basic() {
        let result = diff(&series(&[1.0, 4.0, f64::NAN, 2.0, 3.0]));
        assert_eq!(result, vec![None, Some(3.0), None, None, Some(1.0)]);
    }

    #[test]
    fn pct_change_indicator_name() {
        assert_eq!(PctChange::new(20).name(), "MOM_20");
        assert_eq!(PctChange::new(20).lookback(), 20);
    }
}
