//! Descriptive statistics over plain numeric series.

/// Arithmetic mean. Zero for an empty slice.
pub fn mean(series: &[f64]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.iter().sum::<f64>() / series.len() as f64
}

/// Trailing moving average with a window that grows from the left edge.
///
/// Element `i` averages `series[max(0, i + 1 - window)..=i]`, so the output
/// has the same length as the input. A zero window is treated as 1.
pub fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..series.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(&series[start..=i])
        })
        .collect()
}

/// Population standard deviation. Zero for fewer than two values.
pub fn volatility(series: &[f64]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let avg = mean(series);
    let variance = series
        .iter()
        .map(|x| (x - avg).powi(2))
        .sum::<f64>()
        / series.len() as f64;
    variance.sqrt()
}

/// Largest absolute lagged autocovariance sum, over lags `1..=min(12, len / 2 - 1)`.
///
/// This is a relative signal strength, not a normalized coefficient.
/// Series too short to have a lag return 0.
pub fn seasonality(series: &[f64]) -> f64 {
    let max_lag = (series.len() / 2).saturating_sub(1).min(12);
    if max_lag == 0 {
        return 0.0;
    }

    let avg = mean(series);
    let centered: Vec<f64> = series.iter().map(|x| x - avg).collect();

    (1..=max_lag)
        .map(|lag| {
            centered[lag..]
                .iter()
                .zip(&centered)
                .map(|(current, lagged)| current * lagged)
                .sum::<f64>()
                .abs()
        })
        .fold(0.0, f64::max)
}

/// The slice of at most `len` elements ending at `index` (inclusive).
pub(crate) fn trailing(series: &[f64], index: usize, len: usize) -> &[f64] {
    let end = (index + 1).min(series.len());
    let start = end.saturating_sub(len);
    &series[start..end]
}
