//! Repository for the `run_stages` table.

use chefboard_core::stages::FAILURE_MARKER;
use chefboard_core::types::Timestamp;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::stage::RunStage;

const COLUMNS: &str = "id, run_id, name, started, finished, duration_seconds";

pub struct StageRepo;

impl StageRepo {
    /// Append a completed stage event.
    pub async fn create(
        pool: &PgPool,
        run_id: Uuid,
        name: &str,
        started: Timestamp,
        finished: Timestamp,
        duration_seconds: f64,
    ) -> Result<RunStage, sqlx::Error> {
        let query = format!(
            "INSERT INTO run_stages (run_id, name, started, finished, duration_seconds) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RunStage>(&query)
            .bind(run_id)
            .bind(name)
            .bind(started)
            .bind(finished)
            .bind(duration_seconds)
            .fetch_one(pool)
            .await
    }

    /// List a run's stages in chronological (finish time) order.
    pub async fn list_by_run(pool: &PgPool, run_id: Uuid) -> Result<Vec<RunStage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM run_stages WHERE run_id = $1 ORDER BY finished"
        );
        sqlx::query_as::<_, RunStage>(&query)
            .bind(run_id)
            .fetch_all(pool)
            .await
    }

    /// The most recently finished stage of a run, if any.
    pub async fn latest_for_run(
        pool: &PgPool,
        run_id: Uuid,
    ) -> Result<Option<RunStage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM run_stages WHERE run_id = $1 \
             ORDER BY finished DESC LIMIT 1"
        );
        sqlx::query_as::<_, RunStage>(&query)
            .bind(run_id)
            .fetch_optional(pool)
            .await
    }

    /// Whether any stage of the run carries the failure marker.
    pub async fn has_failure(pool: &PgPool, run_id: Uuid) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM run_stages WHERE run_id = $1 AND name LIKE $2)",
        )
        .bind(run_id)
        .bind(format!("%{FAILURE_MARKER}%"))
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
