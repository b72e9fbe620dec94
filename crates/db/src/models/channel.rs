//! Channel models and DTOs.

use chefboard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `channels` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Channel {
    pub id: DbId,
    /// Public identity, deterministic from (source_id, source_domain).
    pub channel_id: Uuid,
    pub name: String,
    pub description: String,
    pub version: i32,
    pub source_domain: Option<String>,
    pub source_id: Option<String>,
    pub spec_sheet_url: Option<String>,
    pub chef_repo_url: Option<String>,
    pub registered_by_email: Option<String>,
    pub default_content_server: String,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

impl Channel {
    /// Hex form of the public id, as used in content-server APIs and the
    /// tree cache directory layout.
    pub fn channel_id_hex(&self) -> String {
        self.channel_id.simple().to_string()
    }

    /// Edit URL for this channel on its content server.
    pub fn channel_url(&self) -> String {
        format!(
            "{}/{}/edit",
            self.default_content_server,
            self.channel_id_hex()
        )
    }
}

/// DTO for inserting a new channel.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateChannel {
    pub channel_id: Uuid,
    pub name: String,
    pub description: String,
    pub source_domain: String,
    pub source_id: String,
    pub spec_sheet_url: Option<String>,
    pub chef_repo_url: Option<String>,
    pub registered_by_email: Option<String>,
    pub default_content_server: String,
}

/// Request body for the follow/unfollow endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowRequest {
    pub email: String,
    pub save_channel_to_profile: bool,
}
