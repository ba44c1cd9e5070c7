//! Period aggregation of raw observations.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate};
use log::debug;

use super::series::{mean, seasonality, volatility};
use crate::mental_health::parse::Observation;
use crate::mental_health::{AggregatedSeries, Granularity, TrendPoint};

/// Parse an upstream period label into the first day it covers.
///
/// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD` and RFC 3339 timestamps.
pub fn parse_period(time: &str) -> Option<NaiveDate> {
    let time = time.trim();

    if let Ok(date) = NaiveDate::parse_from_str(time, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(time) {
        return Some(timestamp.date_naive());
    }

    let mut parts = time.splitn(2, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = match parts.next() {
        Some(month) => month.parse().ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Sortable bucket key: year plus month (1-12), quarter (1-4) or 0.
fn bucket(date: NaiveDate, granularity: Granularity) -> (i32, u32) {
    match granularity {
        Granularity::Monthly => (date.year(), date.month()),
        Granularity::Quarterly => (date.year(), date.month0() / 3 + 1),
        Granularity::Yearly => (date.year(), 0),
    }
}

fn bucket_label((year, sub): (i32, u32), granularity: Granularity) -> String {
    match granularity {
        Granularity::Monthly => format!("{:04}-{:02}", year, sub),
        Granularity::Quarterly => format!("{:04}-Q{}", year, sub),
        Granularity::Yearly => format!("{:04}", year),
    }
}

/// Group observations into buckets and average each one.
///
/// Each bucket yields one point with the rounded average, plus volatility
/// and seasonality over the bucket's raw values. Points are ordered
/// chronologically. Observations whose time cannot be parsed are skipped.
pub fn aggregate(observations: &[Observation], granularity: Granularity) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();

    for observation in observations {
        match parse_period(&observation.time) {
            Some(date) => buckets
                .entry(bucket(date, granularity))
                .or_default()
                .push(observation.value),
            None => debug!(
                "Skipping observation with unparseable time '{}'",
                observation.time
            ),
        }
    }

    buckets
        .into_iter()
        .map(|(key, values)| TrendPoint {
            volatility: Some(volatility(&values)),
            seasonality: Some(seasonality(&values)),
            ..TrendPoint::new(bucket_label(key, granularity), mean(&values).round())
        })
        .collect()
}

/// Aggregate at every granularity.
pub fn aggregate_all(observations: &[Observation]) -> AggregatedSeries {
    let series = AggregatedSeries {
        monthly: aggregate(observations, Granularity::Monthly),
        quarterly: aggregate(observations, Granularity::Quarterly),
        yearly: aggregate(observations, Granularity::Yearly),
    };
    debug!(
        "Aggregated {} observations into {} monthly, {} quarterly, {} yearly buckets",
        observations.len(),
        series.monthly.len(),
        series.quarterly.len(),
        series.yearly.len()
    );
    series
}
