//! Mental health service traits.

use async_trait::async_trait;

use super::model::MentalHealthSnapshot;
use crate::errors::Result;

/// Produces mental health snapshots for display.
#[async_trait]
pub trait MentalHealthServiceTrait: Send + Sync {
    /// Run the full pipeline. Never fails: on upstream failure the fallback
    /// snapshot is returned.
    async fn fetch_mental_health_data(&self) -> MentalHealthSnapshot;

    /// Run the pipeline and surface upstream failures instead of falling back.
    async fn try_fetch_mental_health_data(&self) -> Result<MentalHealthSnapshot>;
}
