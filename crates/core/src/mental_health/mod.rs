//! Mental health statistics module.
//!
//! ```text
//! MentalHealthService → FeedClient (cache → retry/proxy → rate limit)
//!        ↓
//!   parse → validate → analytics → quality
//!        ↓
//! MentalHealthSnapshot   (or the fallback snapshot on upstream failure)
//! ```
//!
//! - **Models** (`model.rs`) - Snapshot, trend points, quality metrics
//! - **Parse** (`parse.rs`) - Typed interpretation of upstream JSON
//! - **Fallback** (`fallback.rs`) - Every static default in one place
//! - **Traits** (`traits.rs`) - Service interface
//! - **Service** (`service.rs`) - Pipeline orchestration

pub mod fallback;
mod model;
pub mod parse;
mod service;
mod traits;


pub use model::{
    AggregatedSeries, AssembledRecord, DataQuality, Granularity, MentalHealthSnapshot,
    QualityLevel, QualityMetric, TrackedField, Trend, TrendPoint, ValidationResult,
};
pub use parse::{Observation, ParseOutcome};
pub use service::{
    assemble_snapshot, MentalHealthService, RawPayloads, ECONOMIC_DATASET, PREVALENCE_DATASET,
    WHO_EARLY_ONSET_FILTER, WHO_INDICATOR_PATH,
};
pub use traits::MentalHealthServiceTrait;
