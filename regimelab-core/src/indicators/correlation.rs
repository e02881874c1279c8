//! Rolling Pearson correlation between two aligned series.

use super::rolling::window_mean;

/// Correlation of `x` and `y` over each trailing `window`.
///
/// Missing unless all `window` pairs in the window are present. A window in
/// which either side has zero variance has no defined correlation and is
/// missing as well.
pub fn rolling_corr(x: &[Option<f64>], y: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    debug_assert_eq!(x.len(), y.len(), "rolling_corr inputs must be aligned");
    let n = x.len().min(y.len());
    let mut result = vec![None; x.len()];
    if window < 2 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        let xs = &x[(i + 1 - window)..=i];
        let ys = &y[(i + 1 - window)..=i];
        let (Some(mx), Some(my)) = (window_mean(xs), window_mean(ys)) else {
            continue;
        };

        let mut sxy = 0.0;
        let mut sxx = 0.0;
        let mut syy = 0.0;
        for (a, b) in xs.iter().flatten().zip(ys.iter().flatten()) {
            let dx = a - mx;
            let dy = b - my;
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
        }

        let denom = (sxx * syy).sqrt();
        if denom > 0.0 {
            result[i] = Some((sxy / denom).clamp(-1.0, 1.0));
        }
    }

    result
}
