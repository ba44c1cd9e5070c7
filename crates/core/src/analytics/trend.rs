//! Trend classification and trend-point construction.

use log::debug;

use super::series::{moving_average, seasonality, trailing, volatility};
use crate::mental_health::parse::Observation;
use crate::mental_health::{Trend, TrendPoint};

/// Changes smaller than this percentage are considered stable.
pub const STABLE_THRESHOLD_PCT: f64 = 1.0;

/// Window used for the moving average.
pub const MOVING_AVERAGE_WINDOW: usize = 3;

/// Trailing points used for volatility.
pub const VOLATILITY_WINDOW: usize = 3;

/// Trailing points used for seasonality.
pub const SEASONALITY_WINDOW: usize = 12;

/// Number of recent periods exposed as trend points.
pub const RECENT_PERIODS: usize = 5;

/// Percent change from `previous` to `current` and its direction.
///
/// Returns `None` when there is nothing meaningful to compare against
/// (previous is zero or the change is not finite).
pub fn classify_change(previous: f64, current: f64) -> Option<(f64, Trend)> {
    if previous == 0.0 {
        return None;
    }
    let change_pct = (current - previous) / previous * 100.0;
    if !change_pct.is_finite() {
        return None;
    }

    let trend = if change_pct.abs() < STABLE_THRESHOLD_PCT {
        Trend::Stable
    } else if change_pct > 0.0 {
        Trend::Up
    } else {
        Trend::Down
    };
    Some((change_pct, trend))
}

/// Build trend points for the last `count` observations.
///
/// Analytics look back over the full history: the moving average is computed
/// over every observation, volatility over the 3 points ending at each
/// period and seasonality over up to 12. Change and direction compare each
/// point with the previous point in the returned window, on rounded values.
pub fn recent_trend_points(observations: &[Observation], count: usize) -> Vec<TrendPoint> {
    let values: Vec<f64> = observations.iter().map(|o| o.value).collect();
    let averages = moving_average(&values, MOVING_AVERAGE_WINDOW);
    let start = observations.len().saturating_sub(count);

    let mut points: Vec<TrendPoint> = Vec::with_capacity(observations.len() - start);
    for (index, observation) in observations.iter().enumerate().skip(start) {
        let value = observation.value.round();
        let change = points
            .last()
            .and_then(|previous| classify_change(previous.value, value));

        points.push(TrendPoint {
            period: observation.time.clone(),
            value,
            change_pct: change.map(|(pct, _)| pct),
            trend: change.map(|(_, trend)| trend),
            moving_average: averages.get(index).map(|avg| avg.round()),
            volatility: Some(volatility(trailing(&values, index, VOLATILITY_WINDOW))),
            seasonality: Some(seasonality(trailing(&values, index, SEASONALITY_WINDOW))),
        });
    }

    debug!(
        "Built {} trend points from {} observations",
        points.len(),
        observations.len()
    );
    points
}
