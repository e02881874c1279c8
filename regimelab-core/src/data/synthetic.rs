//! Deterministic synthetic price provider for offline runs.
//!
//! Each symbol gets its own random walk seeded from the BLAKE3 hash of the
//! symbol name, so the same request always yields the same bars. Weekends
//! are skipped.

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy)]
pub struct SyntheticProvider {
    start_price: f64,
    max_daily_move: f64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            max_daily_move: 0.03,
        }
    }
}

impl SyntheticProvider {
    pub fn new(start_price: f64, max_daily_move: f64) -> Self {
        assert!(start_price > 0.0, "start price must be positive");
        assert!(
            (0.0..1.0).contains(&max_daily_move),
            "daily move must be in [0, 1)"
        );
        Self {
            start_price,
            max_daily_move,
        }
    }

    /// Random walk for `symbol` over the weekdays in `start..=end`.
    pub fn bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<RawBar> {
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::new();
        let mut price = self.start_price;
        for date in start.iter_days().take_while(|d| *d <= end) {
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }

            let change = if self.max_daily_move > 0.0 {
                rng.gen_range(-self.max_daily_move..self.max_daily_move)
            } else {
                0.0
            };
            let open = price;
            let close = price * (1.0 + change);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(RawBar {
                date,
                open,
                high,
                low,
                close,
                volume,
                adj_close: close,
            });
            price = close;
        }
        bars
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars: self.bars(symbol, start, end),
            source: DataSource::Synthetic,
        })
    }
}
