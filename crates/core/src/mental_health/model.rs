//! Mental health statistics domain models.
//!
//! This module contains the data structures produced by the pipeline:
//! - Trend points and their classification
//! - Data quality grades and metrics
//! - Period aggregations
//! - The assembled snapshot handed to consumers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Trend
// =============================================================================

/// Direction of change between two consecutive periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Stable,
    Up,
    Down,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Stable => "stable",
            Trend::Up => "up",
            Trend::Down => "down",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One reporting period of a series, with derived analytics.
///
/// Points are produced once and never mutated; a sequence of points is
/// ordered by period ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Period label (e.g. "2023", "2023-04", "2023-Q2").
    pub period: String,
    /// Observed (or bucket-averaged) value, rounded.
    pub value: f64,
    /// Percent change from the previous point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moving_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonality: Option<f64>,
}

impl TrendPoint {
    /// A bare point with no derived analytics.
    pub fn new(period: impl Into<String>, value: f64) -> Self {
        Self {
            period: period.into(),
            value,
            change_pct: None,
            trend: None,
            moving_average: None,
            volatility: None,
            seasonality: None,
        }
    }
}

// =============================================================================
// Quality
// =============================================================================

/// Coarse quality grade.
///
/// Ordered from worst to best: Low < Medium < High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Low,
    Medium,
    High,
}

impl QualityLevel {
    /// Grade a ratio in `[0, 1]`: High above 0.9, Medium above 0.7, else Low.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 0.9 {
            QualityLevel::High
        } else if ratio > 0.7 {
            QualityLevel::Medium
        } else {
            QualityLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::Low => "low",
            QualityLevel::Medium => "medium",
            QualityLevel::High => "high",
        }
    }
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quality assessment of a single field (or of the whole record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetric {
    pub level: QualityLevel,
    /// Confidence percentage in `[0, 100]`.
    pub confidence: f64,
    pub verified_at: DateTime<Utc>,
    pub source: String,
    /// Human-readable problems, in the order they were found.
    pub issues: Vec<String>,
}

/// Quality of an assembled record: one metric per tracked field plus overall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub prevalence: QualityMetric,
    pub economic_impact: QualityMetric,
    pub early_onset: QualityMetric,
    pub overall: QualityMetric,
    /// Fraction of record fields present.
    pub completeness: f64,
    /// Freshness, degrading linearly over a year.
    pub timeliness: f64,
    /// Fraction of adjacent trend points sharing a direction.
    pub consistency: f64,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Bucket size for period aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Monthly,
    Quarterly,
    Yearly,
}

/// Bucket-averaged series at each granularity, chronologically ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSeries {
    pub monthly: Vec<TrendPoint>,
    pub quarterly: Vec<TrendPoint>,
    pub yearly: Vec<TrendPoint>,
}

impl AggregatedSeries {
    pub fn get(&self, granularity: Granularity) -> &[TrendPoint] {
        match granularity {
            Granularity::Monthly => &self.monthly,
            Granularity::Quarterly => &self.quarterly,
            Granularity::Yearly => &self.yearly,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.monthly.is_empty() && self.quarterly.is_empty() && self.yearly.is_empty()
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Outcome of sanitizing one raw value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Sanitized value, or the field default when invalid.
    pub value: f64,
    pub quality: QualityLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// =============================================================================
// Snapshot
// =============================================================================

/// Scalar fields sourced from an upstream and graded individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackedField {
    Prevalence,
    EconomicImpact,
    EarlyOnset,
}

impl TrackedField {
    /// Display name of the upstream the field comes from.
    pub fn source(&self) -> &'static str {
        match self {
            TrackedField::Prevalence | TrackedField::EconomicImpact => "Statistics Canada",
            TrackedField::EarlyOnset => "WHO GHO",
        }
    }
}

/// Intermediate record between parsing and scoring.
///
/// A field is `None` when its upstream payload could not be interpreted.
/// Issues found while parsing are kept per field so the scorer can surface
/// them next to that field's grade.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledRecord {
    pub prevalence: Option<ValidationResult>,
    pub economic_impact: Option<ValidationResult>,
    pub early_onset: Option<ValidationResult>,
    pub trends: Option<Vec<TrendPoint>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub issues: HashMap<TrackedField, Vec<String>>,
}

impl AssembledRecord {
    /// Number of top-level fields counted for completeness.
    pub const FIELD_COUNT: usize = 5;

    pub fn field(&self, field: TrackedField) -> Option<&ValidationResult> {
        match field {
            TrackedField::Prevalence => self.prevalence.as_ref(),
            TrackedField::EconomicImpact => self.economic_impact.as_ref(),
            TrackedField::EarlyOnset => self.early_onset.as_ref(),
        }
    }

    /// Number of top-level fields that are present.
    pub fn present_fields(&self) -> usize {
        [
            self.prevalence.is_some(),
            self.economic_impact.is_some(),
            self.early_onset.is_some(),
            self.trends.is_some(),
            self.last_updated.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    pub fn issues_for(&self, field: TrackedField) -> &[String] {
        self.issues.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn push_issue(&mut self, field: TrackedField, issue: impl Into<String>) {
        self.issues.entry(field).or_default().push(issue.into());
    }
}

/// Everything a consumer needs to display the statistics.
///
/// Created once per pipeline run and owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentalHealthSnapshot {
    /// Prevalence percentage.
    pub prevalence: f64,
    /// Economic impact in billions.
    pub economic_impact: f64,
    /// Percentage of conditions with onset before 24.
    pub early_onset: f64,
    pub support_availability: String,
    /// Most recent periods, oldest first.
    pub trends: Vec<TrendPoint>,
    pub last_updated: DateTime<Utc>,
    pub data_quality: DataQuality,
    pub aggregated_data: AggregatedSeries,
}
