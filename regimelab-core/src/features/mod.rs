//! Feature stages. Each stage takes the previous table and returns a
//! superset of it; none of them removes or rewrites an existing column.

pub mod expander;
pub mod market;
pub mod regime;

pub use expander::{compute_warmup, expand_indicators, indicator_set};
pub use market::{
    add_market_features, MARKET_MEAN_RETURN, MARKET_PERCENT_ABOVE_MA, MARKET_VOLATILITY,
};
pub use regime::{
    add_regime_features, correlation_column, SPY_TREND, SPY_VIX_RATIO, VIX_TREND,
};
