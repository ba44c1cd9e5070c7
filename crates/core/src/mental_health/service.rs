//! Mental health pipeline orchestration.
//!
//! The service fetches the three upstream payloads concurrently (through the
//! feed client's cache, rate limiter and proxy fallback), parses and validates
//! them, derives trend analytics, scores data quality and assembles a
//! [`MentalHealthSnapshot`]. Upstream failure is logged once here and turned
//! into the fallback snapshot.

use std::error::Error as _;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde_json::Value;

use mindscope_feeds::{FeedClient, FeedError, FeedRequest, Upstream};

use super::fallback::{
    fallback_snapshot, value_or, FALLBACK_EARLY_ONSET, FALLBACK_ECONOMIC_IMPACT,
    FALLBACK_PREVALENCE, SUPPORT_AVAILABILITY,
};
use super::model::{AggregatedSeries, AssembledRecord, MentalHealthSnapshot, TrackedField};
use super::parse::{parse_indicator, parse_series, ParseOutcome, ParsedSeries};
use super::traits::MentalHealthServiceTrait;
use crate::analytics::{aggregate_all, recent_trend_points, RECENT_PERIODS};
use crate::errors::{Error, Result};
use crate::quality;
use crate::validator::{validate, ValueKind};

/// Statistics Canada table with prevalence observations.
pub const PREVALENCE_DATASET: &str = "1310049401-eng";

/// Statistics Canada table with economic impact observations.
pub const ECONOMIC_DATASET: &str = "3610043401-eng";

/// WHO GHO resource queried for the early-onset indicator.
pub const WHO_INDICATOR_PATH: &str = "Indicator";

/// OData filter selecting the early-onset indicator.
pub const WHO_EARLY_ONSET_FILTER: &str = "IndicatorName eq 'Prevalence of mental disorders' and TimeDim eq 2023 and AgeGroup eq '15-24'";

/// Raw bodies of the three upstream requests.
#[derive(Debug, Clone)]
pub struct RawPayloads {
    pub prevalence: Value,
    pub economic: Value,
    pub early_onset: Value,
}

/// Service assembling mental health snapshots from public statistics.
pub struct MentalHealthService {
    client: FeedClient,
    statcan: Arc<Upstream>,
    who: Arc<Upstream>,
}

impl MentalHealthService {
    /// Creates a new service over the given client and upstreams.
    pub fn new(client: FeedClient, statcan: Upstream, who: Upstream) -> Self {
        Self {
            client,
            statcan: Arc::new(statcan),
            who: Arc::new(who),
        }
    }

    pub fn client(&self) -> &FeedClient {
        &self.client
    }

    fn statcan_request(&self, dataset: &str) -> FeedRequest {
        FeedRequest::new(self.statcan.clone(), dataset)
            .param("format", "json")
            .param("lang", "en")
    }

    pub fn prevalence_request(&self) -> FeedRequest {
        self.statcan_request(PREVALENCE_DATASET)
    }

    pub fn economic_request(&self) -> FeedRequest {
        self.statcan_request(ECONOMIC_DATASET)
    }

    pub fn early_onset_request(&self) -> FeedRequest {
        FeedRequest::new(self.who.clone(), WHO_INDICATOR_PATH)
            .param("$filter", WHO_EARLY_ONSET_FILTER)
    }

    /// Fetch the three payloads concurrently. Fails if any of them fails.
    pub async fn fetch_raw(&self) -> std::result::Result<RawPayloads, FeedError> {
        let prevalence_request = self.prevalence_request();
        let economic_request = self.economic_request();
        let early_onset_request = self.early_onset_request();

        debug!("Fetching prevalence, economic and early-onset data");
        let (prevalence, economic, early_onset) = tokio::try_join!(
            self.client.fetch_cached(&prevalence_request),
            self.client.fetch_cached(&economic_request),
            self.client.fetch_cached(&early_onset_request),
        )?;
        info!("Successfully fetched all data sources");

        Ok(RawPayloads {
            prevalence,
            economic,
            early_onset,
        })
    }
}

/// Log an upstream failure with everything known about it.
fn log_fetch_failure(err: &FeedError) {
    error!(
        "Error fetching mental health data: {} (code: {}, upstream: {})",
        err,
        err.code(),
        err.upstream()
    );

    let mut source = err.source();
    while let Some(cause) = source {
        error!("  caused by: {}", cause);
        source = cause.source();
    }

    if let Some((status, body)) = err.http_detail() {
        error!(
            "API error response: status {}, body: {}",
            status,
            body.unwrap_or("<empty>")
        );
    }
}

/// Validate the latest value of a parsed series, recording parse problems
/// against `field`.
fn latest_of(
    outcome: ParseOutcome<ParsedSeries>,
    field: TrackedField,
    kind: ValueKind,
    record: &mut AssembledRecord,
) -> Option<ParsedSeries> {
    match outcome {
        ParseOutcome::Parsed(series) => {
            for issue in &series.skipped {
                record.push_issue(field, issue.clone());
            }
            if let Some(latest) = series.latest() {
                let result = validate(latest, kind);
                debug!("{:?} validation result: {:?}", field, result);
                match field {
                    TrackedField::Prevalence => record.prevalence = Some(result),
                    TrackedField::EconomicImpact => record.economic_impact = Some(result),
                    TrackedField::EarlyOnset => record.early_onset = Some(result),
                }
            }
            Some(series)
        }
        ParseOutcome::Malformed(reason) => {
            warn!("Malformed {:?} payload: {}", field, reason);
            record.push_issue(field, reason);
            None
        }
    }
}

/// Turn raw payloads into a snapshot as of `now`.
///
/// Pure: malformed payloads leave their record field empty, which lowers the
/// quality score and shows the fallback value for that field.
pub fn assemble_snapshot(raw: &RawPayloads, now: DateTime<Utc>) -> MentalHealthSnapshot {
    let mut record = AssembledRecord {
        last_updated: Some(now),
        ..Default::default()
    };

    let prevalence = latest_of(
        parse_series(&raw.prevalence),
        TrackedField::Prevalence,
        ValueKind::Prevalence,
        &mut record,
    );
    latest_of(
        parse_series(&raw.economic),
        TrackedField::EconomicImpact,
        ValueKind::Economic,
        &mut record,
    );

    match parse_indicator(&raw.early_onset) {
        ParseOutcome::Parsed(fraction) => {
            let result = validate(fraction * 100.0, ValueKind::EarlyOnset);
            debug!("EarlyOnset validation result: {:?}", result);
            record.early_onset = Some(result);
        }
        ParseOutcome::Malformed(reason) => {
            warn!("Malformed EarlyOnset payload: {}", reason);
            record.push_issue(TrackedField::EarlyOnset, reason);
        }
    }

    let aggregated_data = match &prevalence {
        Some(series) => {
            record.trends = Some(recent_trend_points(&series.observations, RECENT_PERIODS));
            aggregate_all(&series.observations)
        }
        None => AggregatedSeries::default(),
    };

    let data_quality = quality::score(&record, now);

    MentalHealthSnapshot {
        prevalence: value_or(record.prevalence.as_ref(), FALLBACK_PREVALENCE),
        economic_impact: value_or(record.economic_impact.as_ref(), FALLBACK_ECONOMIC_IMPACT),
        early_onset: value_or(record.early_onset.as_ref(), FALLBACK_EARLY_ONSET),
        support_availability: SUPPORT_AVAILABILITY.to_string(),
        trends: record.trends.unwrap_or_default(),
        last_updated: now,
        data_quality,
        aggregated_data,
    }
}

#[async_trait]
impl MentalHealthServiceTrait for MentalHealthService {
    async fn fetch_mental_health_data(&self) -> MentalHealthSnapshot {
        info!("Starting mental health data fetch");
        match self.try_fetch_mental_health_data().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                match &err {
                    Error::Feed(feed) => log_fetch_failure(feed),
                    other => error!("Mental health data fetch failed: {}", other),
                }
                warn!("Returning fallback mental health data");
                fallback_snapshot(Utc::now())
            }
        }
    }

    async fn try_fetch_mental_health_data(&self) -> Result<MentalHealthSnapshot> {
        let raw = self.fetch_raw().await?;
        let snapshot = assemble_snapshot(&raw, Utc::now());
        info!(
            "Mental health data processing completed (overall quality: {})",
            snapshot.data_quality.overall.level
        );
        Ok(snapshot)
    }
}
