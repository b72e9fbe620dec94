//! Repository for the `runs` table.

use chefboard_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::run::{CreateRun, Run, UpdateRun};

const COLUMNS: &str = "run_id, channel_id, chef_name, chef_version, resource_counts, \
     resource_sizes, state, extra_options, started_by_email, started_by_token, \
     content_server, created_at, modified_at";

pub struct RunRepo;

impl RunRepo {
    /// Insert a new run.
    pub async fn create(pool: &PgPool, input: &CreateRun) -> Result<Run, sqlx::Error> {
        let query = format!(
            "INSERT INTO runs \
                (run_id, channel_id, chef_name, chef_version, extra_options, \
                 started_by_email, started_by_token, content_server) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(input.run_id)
            .bind(input.channel_id)
            .bind(&input.chef_name)
            .bind(&input.chef_version)
            .bind(&input.extra_options)
            .bind(&input.started_by_email)
            .bind(&input.started_by_token)
            .bind(&input.content_server)
            .fetch_one(pool)
            .await
    }

    /// Find a run by its UUID.
    pub async fn find_by_id(pool: &PgPool, run_id: Uuid) -> Result<Option<Run>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM runs WHERE run_id = $1");
        sqlx::query_as::<_, Run>(&query)
            .bind(run_id)
            .fetch_optional(pool)
            .await
    }

    /// List runs for a channel, most recent first.
    pub async fn list_by_channel(pool: &PgPool, channel_id: DbId) -> Result<Vec<Run>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM runs WHERE channel_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(channel_id)
            .fetch_all(pool)
            .await
    }

    /// The most recently created run for a channel, if any.
    pub async fn latest_for_channel(
        pool: &PgPool,
        channel_id: DbId,
    ) -> Result<Option<Run>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM runs WHERE channel_id = $1 \
             ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(channel_id)
            .fetch_optional(pool)
            .await
    }

    /// Runs created before the given run on the same channel, newest first.
    ///
    /// Used to locate the previous non-failed run for stat diffing.
    pub async fn earlier_runs(pool: &PgPool, run: &Run) -> Result<Vec<Run>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM runs \
             WHERE channel_id = $1 AND created_at < $2 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(run.channel_id)
            .bind(run.created_at)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update (stats, flags, state). Absent fields keep
    /// their current value.
    pub async fn update(
        pool: &PgPool,
        run_id: Uuid,
        input: &UpdateRun,
    ) -> Result<Option<Run>, sqlx::Error> {
        let query = format!(
            "UPDATE runs SET \
                resource_counts = COALESCE($2, resource_counts), \
                resource_sizes = COALESCE($3, resource_sizes), \
                extra_options = COALESCE($4, extra_options), \
                state = COALESCE($5, state), \
                modified_at = NOW() \
             WHERE run_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(run_id)
            .bind(&input.resource_counts)
            .bind(&input.resource_sizes)
            .bind(&input.extra_options)
            .bind(&input.state)
            .fetch_optional(pool)
            .await
    }

    /// Set the run state to the latest completed stage name.
    pub async fn set_state(pool: &PgPool, run_id: Uuid, state: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE runs SET state = $2, modified_at = NOW() WHERE run_id = $1")
            .bind(run_id)
            .bind(state)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Replace the run's extra options wholesale.
    pub async fn set_extra_options(
        pool: &PgPool,
        run_id: Uuid,
        extra_options: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE runs SET extra_options = $2, modified_at = NOW() WHERE run_id = $1")
            .bind(run_id)
            .bind(extra_options)
            .execute(pool)
            .await?;
        Ok(())
    }
}
