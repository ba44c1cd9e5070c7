//! Lightweight descriptive time-series analytics.
//!
//! - **Series** (`series.rs`) - mean, moving average, volatility, seasonality
//! - **Trend** (`trend.rs`) - change classification and recent trend points
//! - **Aggregate** (`aggregate.rs`) - monthly / quarterly / yearly buckets
//!
//! Everything here is pure.

mod aggregate;
mod series;
mod trend;

pub use aggregate::{aggregate, aggregate_all, parse_period};
pub use series::{mean, moving_average, seasonality, volatility};
pub use trend::{
    classify_change, recent_trend_points, MOVING_AVERAGE_WINDOW, RECENT_PERIODS,
    SEASONALITY_WINDOW, STABLE_THRESHOLD_PCT, VOLATILITY_WINDOW,
};
