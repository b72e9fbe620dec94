//! Stage event models and DTOs.

use chefboard_core::stages::StageEvent;
use chefboard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `run_stages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RunStage {
    pub id: DbId,
    pub run_id: Uuid,
    pub name: String,
    pub started: Timestamp,
    pub finished: Timestamp,
    pub duration_seconds: f64,
}

impl RunStage {
    /// Project the row into the timeline event used by the stage math.
    pub fn to_event(&self) -> StageEvent {
        StageEvent {
            name: self.name.clone(),
            finished: self.finished,
            duration_seconds: self.duration_seconds,
        }
    }
}

/// Request body for a job reporting a completed stage.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportStageRequest {
    pub stage: String,
    /// The job's self-reported elapsed time for this stage.
    pub duration_seconds: f64,
}
