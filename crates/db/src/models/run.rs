//! Run models and DTOs.

use chefboard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `runs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Run {
    pub run_id: Uuid,
    pub channel_id: DbId,
    pub chef_name: String,
    pub chef_version: Option<String>,
    /// `{content_kind: count}` reported by the job near completion.
    pub resource_counts: Option<serde_json::Value>,
    /// `{content_kind: bytes}` reported by the job near completion.
    pub resource_sizes: Option<serde_json::Value>,
    /// Mirrors the name of the most recently completed stage.
    pub state: Option<String>,
    /// Free-form flags: staged/published plus command-line toggles.
    pub extra_options: Option<serde_json::Value>,
    pub started_by_email: Option<String>,
    /// Credential used against the content server for this run.
    #[serde(skip_serializing)]
    pub started_by_token: Option<String>,
    pub content_server: String,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

impl Run {
    pub fn run_id_hex(&self) -> String {
        self.run_id.simple().to_string()
    }

    /// Whether `extra_options` carries the given truthy flag.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.extra_options
            .as_ref()
            .and_then(|o| o.get(flag))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Request body from a starting job for creating a new run.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRunRequest {
    pub channel_id: Uuid,
    pub chef_name: String,
    pub chef_version: Option<String>,
    pub extra_options: Option<serde_json::Value>,
    pub started_by_email: Option<String>,
    pub started_by_token: Option<String>,
    /// Defaults to the channel's content server when omitted.
    pub content_server: Option<String>,
}

/// Fully resolved DTO for inserting a new run.
#[derive(Debug, Clone)]
pub struct CreateRun {
    pub run_id: Uuid,
    pub channel_id: DbId,
    pub chef_name: String,
    pub chef_version: Option<String>,
    pub extra_options: Option<serde_json::Value>,
    pub started_by_email: Option<String>,
    pub started_by_token: Option<String>,
    pub content_server: String,
}

/// Partial update posted by the job as it finishes (stats, flags).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRun {
    pub resource_counts: Option<serde_json::Value>,
    pub resource_sizes: Option<serde_json::Value>,
    pub extra_options: Option<serde_json::Value>,
    pub state: Option<String>,
}
