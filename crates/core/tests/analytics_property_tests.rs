//! Property-based integration tests for the analytics and scoring pipeline.
//!
//! These tests verify that universal properties hold across all valid inputs,
//! using the `proptest` crate for random test case generation.

use chrono::Utc;
use mindscope_core::analytics::{
    aggregate, moving_average, parse_period, recent_trend_points, seasonality, volatility,
    RECENT_PERIODS,
};
use mindscope_core::mental_health::{assemble_snapshot, Granularity, Observation, RawPayloads};
use proptest::prelude::*;
use serde_json::json;

// =============================================================================
// Generators
// =============================================================================

/// Generates a finite observation value in a realistic range.
fn arb_value() -> impl Strategy<Value = f64> {
    -1_000.0f64..1_000_000.0
}

/// Generates a series of finite values.
fn arb_series() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_value(), 0..40)
}

/// Generates a monthly observation between 2000 and 2030.
fn arb_observation() -> impl Strategy<Value = Observation> {
    (2000i32..2030, 1u32..=12, 0.0f64..100.0).prop_map(|(year, month, value)| {
        Observation::new(format!("{:04}-{:02}", year, month), value)
    })
}

fn arb_observations() -> impl Strategy<Value = Vec<Observation>> {
    prop::collection::vec(arb_observation(), 0..60)
}

fn granularity() -> impl Strategy<Value = Granularity> {
    prop_oneof![
        Just(Granularity::Monthly),
        Just(Granularity::Quarterly),
        Just(Granularity::Yearly),
    ]
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Moving average preserves length and stays within the series bounds.
    #[test]
    fn moving_average_is_bounded(series in arb_series(), window in 1usize..6) {
        let averages = moving_average(&series, window);
        prop_assert_eq!(averages.len(), series.len());

        if let (Some(min), Some(max)) = (
            series.iter().cloned().reduce(f64::min),
            series.iter().cloned().reduce(f64::max),
        ) {
            for avg in &averages {
                prop_assert!(*avg >= min - 1e-6 && *avg <= max + 1e-6);
            }
        }
    }

    /// Volatility and seasonality are never negative.
    #[test]
    fn spread_measures_are_non_negative(series in arb_series()) {
        prop_assert!(volatility(&series) >= 0.0);
        prop_assert!(seasonality(&series) >= 0.0);
    }

    /// A constant series has no spread.
    #[test]
    fn constant_series_has_zero_volatility(value in arb_value(), len in 1usize..30) {
        let series = vec![value; len];
        prop_assert!(volatility(&series).abs() < 1e-6);
    }

    /// At most five trend points, ending at the latest observation.
    #[test]
    fn recent_points_end_at_latest(observations in arb_observations()) {
        let points = recent_trend_points(&observations, RECENT_PERIODS);
        prop_assert_eq!(points.len(), observations.len().min(RECENT_PERIODS));
        if let (Some(point), Some(last)) = (points.last(), observations.last()) {
            prop_assert_eq!(&point.period, &last.time);
        }
        if let Some(first) = points.first() {
            prop_assert!(first.trend.is_none());
        }
    }

    /// Aggregated buckets are strictly chronological and never outnumber observations.
    #[test]
    fn aggregation_is_chronological(
        observations in arb_observations(),
        granularity in granularity(),
    ) {
        let points = aggregate(&observations, granularity);
        prop_assert!(points.len() <= observations.len());

        let starts: Vec<_> = points
            .iter()
            .map(|p| {
                let label = p.period.replace("-Q", "-0");
                parse_period(&label)
            })
            .collect();
        for pair in starts.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }

    /// Quality ratios stay in [0, 1] and confidence in [0, 100] for any payload.
    #[test]
    fn quality_ratios_are_bounded(
        values in prop::collection::vec(-50.0f64..150.0, 0..12),
        indicator in proptest::option::of(-1.0f64..2.0),
    ) {
        let observations: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| json!({ "time": format!("{}", 2010 + i), "v": v.to_string() }))
            .collect();
        let raw = RawPayloads {
            prevalence: json!({ "observations": [{ "observations": observations }] }),
            economic: json!({ "observations": [{ "observations": observations }] }),
            early_onset: match indicator {
                Some(v) => json!({ "value": [{ "Value": v }] }),
                None => json!({}),
            },
        };

        let snapshot = assemble_snapshot(&raw, Utc::now());
        let quality = &snapshot.data_quality;

        for ratio in [quality.completeness, quality.timeliness, quality.consistency] {
            prop_assert!((0.0..=1.0).contains(&ratio));
        }
        for metric in [&quality.prevalence, &quality.economic_impact, &quality.early_onset, &quality.overall] {
            prop_assert!((0.0..=100.0).contains(&metric.confidence));
        }
        prop_assert!((0.0..=100.0).contains(&snapshot.prevalence));
        prop_assert!((0.0..=100.0).contains(&snapshot.early_onset));
        prop_assert!(snapshot.trends.len() <= RECENT_PERIODS);
    }
}
