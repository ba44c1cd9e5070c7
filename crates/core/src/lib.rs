//! Mindscope Core - mental health statistics pipeline.
//!
//! Turns unreliable public statistical feeds into a validated,
//! quality-scored, time-aggregated [`MentalHealthSnapshot`]:
//!
//! ```text
//! MentalHealthService → FeedClient → raw JSON → parse → validator
//!                                                  → analytics → quality
//!                                                  → MentalHealthSnapshot
//! ```
//!
//! Fetching lives in the `mindscope-feeds` crate; everything after the raw
//! payload is pure and lives here.

pub mod analytics;
pub mod config;
pub mod errors;
pub mod export;
pub mod logging;
pub mod mental_health;
pub mod quality;
pub mod validator;

pub use config::Config;
pub use errors::{Error, ExportError, LoggingError, Result};
pub use export::{export_data, to_csv, to_json, ExportFormat};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use mental_health::{
    MentalHealthService, MentalHealthServiceTrait, MentalHealthSnapshot,
};
pub use validator::{validate, ValueKind};
