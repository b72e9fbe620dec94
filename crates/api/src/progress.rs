//! Live run-progress store.
//!
//! The running job posts its fractional progress here and the dashboard
//! reads it back on every render. Storage is one redis hash per run
//! UUID with (at least) a `progress` field in [0, 1]. There is no
//! locking and no expiry: concurrent writers to the same run id simply
//! last-write-wins per field.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The progress hash fields for one run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunProgress {
    /// Fractional completion in [0, 1].
    pub progress: f64,
}

/// Handle to the progress store.
///
/// Explicitly constructed once at startup and cloned into handlers;
/// the inner [`ConnectionManager`] multiplexes a single connection and
/// reconnects on failure.
#[derive(Clone)]
pub struct ProgressStore {
    conn: ConnectionManager,
}

impl ProgressStore {
    /// Connect to redis at the given URL.
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!(url = %redis_url, "Connected to redis for run progress");
        Ok(Self { conn })
    }

    /// Wrap an existing connection handle (test substitution).
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Read the progress record for a run, if one has been written.
    pub async fn get(&self, run_id: Uuid) -> Result<Option<RunProgress>, redis::RedisError> {
        let mut conn = self.conn.clone();
        let fields: std::collections::HashMap<String, String> =
            conn.hgetall(run_id.simple().to_string()).await?;

        let Some(raw) = fields.get("progress") else {
            return Ok(None);
        };
        Ok(raw.parse::<f64>().ok().map(|progress| RunProgress { progress }))
    }

    /// Write the progress record for a run.
    pub async fn set(
        &self,
        run_id: Uuid,
        progress: &RunProgress,
    ) -> Result<(), redis::RedisError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(
                run_id.simple().to_string(),
                "progress",
                progress.progress.to_string(),
            )
            .await?;
        Ok(())
    }
}
