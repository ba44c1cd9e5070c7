//! Data-quality scoring of an assembled record.
//!
//! Three ratios describe a record:
//! - **completeness**: fraction of top-level fields present
//! - **timeliness**: `1 - age_in_days / 365`, floored at 0
//! - **consistency**: fraction of adjacent trend points sharing a direction
//!
//! Field grades are driven by completeness; the overall grade by the mean of
//! all three. Scoring is pure and never fails.

use chrono::{DateTime, Utc};

use crate::mental_health::{
    AssembledRecord, DataQuality, QualityLevel, QualityMetric, TrackedField, TrendPoint,
};

/// Source label of the overall metric.
pub const OVERALL_SOURCE: &str = "Multiple Sources";

/// Issue attached to every field when the record is incomplete.
pub const MISSING_DATA_ISSUE: &str = "Some data points missing";

const DAYS_PER_YEAR: f64 = 365.0;

/// Clamp a ratio into `[0, 1]`, mapping NaN to 0.
fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}

pub fn completeness(record: &AssembledRecord) -> f64 {
    clamp_ratio(record.present_fields() as f64 / AssembledRecord::FIELD_COUNT as f64)
}

pub fn timeliness(last_updated: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(last_updated) = last_updated else {
        return 0.0;
    };
    let age_days = (now - last_updated).num_milliseconds() as f64 / 86_400_000.0;
    clamp_ratio(1.0 - age_days / DAYS_PER_YEAR)
}

pub fn consistency(trends: Option<&[TrendPoint]>) -> f64 {
    let trends = match trends {
        Some(trends) if trends.len() >= 2 => trends,
        _ => return 0.5,
    };

    let matching = trends
        .windows(2)
        .filter(|pair| pair[0].trend == pair[1].trend)
        .count();
    clamp_ratio(matching as f64 / (trends.len() - 1) as f64)
}

fn field_metric(
    record: &AssembledRecord,
    field: TrackedField,
    completeness: f64,
    now: DateTime<Utc>,
) -> QualityMetric {
    let mut issues = Vec::new();
    if completeness < 1.0 {
        issues.push(MISSING_DATA_ISSUE.to_string());
    }
    if let Some(message) = record.field(field).and_then(|v| v.message.as_ref()) {
        issues.push(message.clone());
    }
    issues.extend(record.issues_for(field).iter().cloned());

    QualityMetric {
        level: QualityLevel::from_ratio(completeness),
        confidence: completeness * 100.0,
        verified_at: now,
        source: field.source().to_string(),
        issues,
    }
}

fn overall_metric(
    completeness: f64,
    timeliness: f64,
    consistency: f64,
    now: DateTime<Utc>,
) -> QualityMetric {
    let score = (completeness + timeliness + consistency) / 3.0;
    let issues = [
        ("completeness", completeness),
        ("timeliness", timeliness),
        ("consistency", consistency),
    ]
    .into_iter()
    .filter(|(_, ratio)| QualityLevel::from_ratio(*ratio) == QualityLevel::Low)
    .map(|(name, ratio)| format!("Low {} ({:.0}%)", name, ratio * 100.0))
    .collect();

    QualityMetric {
        level: QualityLevel::from_ratio(score),
        confidence: score * 100.0,
        verified_at: now,
        source: OVERALL_SOURCE.to_string(),
        issues,
    }
}

/// Score an assembled record as of `now`.
pub fn score(record: &AssembledRecord, now: DateTime<Utc>) -> DataQuality {
    let completeness = completeness(record);
    let timeliness = timeliness(record.last_updated, now);
    let consistency = consistency(record.trends.as_deref());

    DataQuality {
        prevalence: field_metric(record, TrackedField::Prevalence, completeness, now),
        economic_impact: field_metric(record, TrackedField::EconomicImpact, completeness, now),
        early_onset: field_metric(record, TrackedField::EarlyOnset, completeness, now),
        overall: overall_metric(completeness, timeliness, consistency, now),
        completeness,
        timeliness,
        consistency,
    }
}
