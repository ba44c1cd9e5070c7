//! Static defaults used when upstream data is missing or unusable.
//!
//! Every substitution of a default value happens here, so callers can tell
//! a real reading from a placeholder by looking in one place.

use chrono::{DateTime, Utc};

use super::model::{
    AggregatedSeries, DataQuality, MentalHealthSnapshot, QualityLevel, QualityMetric, Trend,
    TrendPoint, ValidationResult,
};

/// Prevalence percentage shown when no reading is available.
pub const FALLBACK_PREVALENCE: f64 = 20.0;

/// Economic impact (billions) shown when no reading is available.
pub const FALLBACK_ECONOMIC_IMPACT: f64 = 51.0;

/// Early-onset percentage shown when no reading is available.
pub const FALLBACK_EARLY_ONSET: f64 = 75.0;

pub const SUPPORT_AVAILABILITY: &str = "24/7";

/// Source label on every metric of a fallback snapshot.
pub const FALLBACK_SOURCE: &str = "Fallback";

/// Value of an optional validation result, or `default` when it is absent.
pub fn value_or(result: Option<&ValidationResult>, default: f64) -> f64 {
    result.map(|r| r.value).unwrap_or(default)
}

/// Fixed five-year series shown when the real one cannot be fetched.
pub fn fallback_trends() -> Vec<TrendPoint> {
    let point = |period: &str,
                 value: f64,
                 change_pct: f64,
                 trend: Trend,
                 moving_average: f64,
                 volatility: f64,
                 seasonality: f64| TrendPoint {
        period: period.to_string(),
        value,
        change_pct: Some(change_pct),
        trend: Some(trend),
        moving_average: Some(moving_average),
        volatility: Some(volatility),
        seasonality: Some(seasonality),
    };

    vec![
        TrendPoint::new("2019", 20.0),
        point("2020", 25.0, 25.0, Trend::Up, 22.5, 2.5, 0.1),
        point("2021", 30.0, 20.0, Trend::Up, 25.0, 2.8, 0.15),
        point("2022", 28.0, -6.7, Trend::Down, 27.7, 2.3, 0.12),
        point("2023", 32.0, 14.3, Trend::Up, 30.0, 2.6, 0.18),
    ]
}

fn fallback_metric(now: DateTime<Utc>) -> QualityMetric {
    QualityMetric {
        level: QualityLevel::Low,
        confidence: 0.0,
        verified_at: now,
        source: FALLBACK_SOURCE.to_string(),
        issues: Vec::new(),
    }
}

/// Quality block of a fallback snapshot: everything Low with zero confidence.
pub fn fallback_quality(now: DateTime<Utc>) -> DataQuality {
    DataQuality {
        prevalence: fallback_metric(now),
        economic_impact: fallback_metric(now),
        early_onset: fallback_metric(now),
        overall: fallback_metric(now),
        completeness: 0.0,
        timeliness: 0.0,
        consistency: 0.0,
    }
}

/// Well-formed snapshot returned when the pipeline cannot produce real data.
pub fn fallback_snapshot(now: DateTime<Utc>) -> MentalHealthSnapshot {
    MentalHealthSnapshot {
        prevalence: FALLBACK_PREVALENCE,
        economic_impact: FALLBACK_ECONOMIC_IMPACT,
        early_onset: FALLBACK_EARLY_ONSET,
        support_availability: SUPPORT_AVAILABILITY.to_string(),
        trends: fallback_trends(),
        last_updated: now,
        data_quality: fallback_quality(now),
        aggregated_data: AggregatedSeries::default(),
    }
}
