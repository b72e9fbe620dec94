//! Repository for the `channels` and `channel_followers` tables.

use chefboard_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::channel::{Channel, CreateChannel};

const COLUMNS: &str = "id, channel_id, name, description, version, source_domain, source_id, \
     spec_sheet_url, chef_repo_url, registered_by_email, default_content_server, \
     created_at, modified_at";

pub struct ChannelRepo;

impl ChannelRepo {
    /// Insert a new channel.
    pub async fn create(pool: &PgPool, input: &CreateChannel) -> Result<Channel, sqlx::Error> {
        let query = format!(
            "INSERT INTO channels \
                (channel_id, name, description, source_domain, source_id, spec_sheet_url, \
                 chef_repo_url, registered_by_email, default_content_server) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Channel>(&query)
            .bind(input.channel_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.source_domain)
            .bind(&input.source_id)
            .bind(&input.spec_sheet_url)
            .bind(&input.chef_repo_url)
            .bind(&input.registered_by_email)
            .bind(&input.default_content_server)
            .fetch_one(pool)
            .await
    }

    /// Find a channel by its public UUID.
    pub async fn find_by_public_id(
        pool: &PgPool,
        channel_id: Uuid,
    ) -> Result<Option<Channel>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM channels WHERE channel_id = $1");
        sqlx::query_as::<_, Channel>(&query)
            .bind(channel_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a channel by its local row id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Channel>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM channels WHERE id = $1");
        sqlx::query_as::<_, Channel>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a channel with this public UUID already exists.
    pub async fn exists(pool: &PgPool, channel_id: Uuid) -> Result<bool, sqlx::Error> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM channels WHERE channel_id = $1)")
                .bind(channel_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// List all channels, most recently active first.
    ///
    /// "Active" means the latest run activity; channels without runs sort
    /// by their own modification time.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Channel>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM channels \
             ORDER BY (SELECT MAX(r.modified_at) FROM runs r WHERE r.channel_id = channels.id) \
                 DESC NULLS LAST, \
                 modified_at DESC"
        );
        sqlx::query_as::<_, Channel>(&query).fetch_all(pool).await
    }

    /// Delete a channel by local id. Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM channels WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether the channel has any runs (deletion is blocked while it does).
    pub async fn has_runs(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM runs WHERE channel_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    // -----------------------------------------------------------------------
    // Followers
    // -----------------------------------------------------------------------

    /// List the emails following a channel.
    pub async fn followers(pool: &PgPool, id: DbId) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT user_email FROM channel_followers WHERE channel_id = $1 ORDER BY user_email",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(email,)| email).collect())
    }

    /// Add or remove a follower. Both directions are idempotent.
    pub async fn set_following(
        pool: &PgPool,
        id: DbId,
        email: &str,
        follow: bool,
    ) -> Result<(), sqlx::Error> {
        if follow {
            sqlx::query(
                "INSERT INTO channel_followers (channel_id, user_email) VALUES ($1, $2) \
                 ON CONFLICT ON CONSTRAINT uq_channel_followers_pair DO NOTHING",
            )
            .bind(id)
            .bind(email)
            .execute(pool)
            .await?;
        } else {
            sqlx::query("DELETE FROM channel_followers WHERE channel_id = $1 AND user_email = $2")
                .bind(id)
                .bind(email)
                .execute(pool)
                .await?;
        }
        Ok(())
    }
}
