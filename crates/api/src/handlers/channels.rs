//! Handlers for channel registration, detail, deletion, following, and
//! remote publish/activate actions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chefboard_core::error::CoreError;
use chefboard_core::registration::{duplicate_channel_error, validate_registration, ChannelRegistration};
use chefboard_db::models::channel::{Channel, CreateChannel, FollowRequest};
use chefboard_db::repositories::{ChannelRepo, RunRepo};
use chefboard_studio::{StudioClient, StudioError};
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::MaybeToken;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a channel by its public UUID or 404.
pub(crate) async fn find_channel(pool: &sqlx::PgPool, channel_id: Uuid) -> AppResult<Channel> {
    ChannelRepo::find_by_public_id(pool, channel_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Channel",
            id: channel_id.to_string(),
        }))
}

/// Build a content-server client for channel-level actions.
///
/// The server is the one the channel's latest run used (falling back to
/// the channel default); the credential is the caller's token.
async fn action_client(
    state: &AppState,
    channel: &Channel,
    token: Option<String>,
) -> AppResult<StudioClient> {
    let token = token.ok_or(AppError::Studio(StudioError::NoToken))?;
    let server = match RunRepo::latest_for_channel(&state.pool, channel.id).await? {
        Some(run) => run.content_server,
        None => channel.default_content_server.clone(),
    };
    Ok(StudioClient::new(server, token))
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

/// POST /api/v1/channels
///
/// Register a new channel. The channel UUID is computed from the
/// (source_id, domain) pair; a collision with an existing channel is a
/// field-level validation failure on `domain`, mirroring the dashboard
/// form behaviour.
pub async fn create_channel(
    State(state): State<AppState>,
    Json(input): Json<ChannelRegistration>,
) -> AppResult<impl IntoResponse> {
    let channel_id = validate_registration(&input).map_err(AppError::Fields)?;

    if ChannelRepo::exists(&state.pool, channel_id).await? {
        return Err(AppError::Fields(vec![duplicate_channel_error()]));
    }

    let create = CreateChannel {
        channel_id,
        name: input.name,
        description: input.description.unwrap_or_default(),
        source_domain: input.domain,
        source_id: input.source_id,
        spec_sheet_url: input.spec_sheet_url,
        chef_repo_url: input.chef_repo_url,
        registered_by_email: input.registered_by_email,
        default_content_server: state.config.default_content_server.clone(),
    };
    let channel = ChannelRepo::create(&state.pool, &create).await?;

    tracing::info!(channel_id = %channel.channel_id, name = %channel.name, "Channel registered");

    Ok((StatusCode::CREATED, Json(DataResponse { data: channel })))
}

// ---------------------------------------------------------------------------
// Get / Delete
// ---------------------------------------------------------------------------

/// GET /api/v1/channels/{channel_id}
pub async fn get_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let channel = find_channel(&state.pool, channel_id).await?;
    Ok(Json(DataResponse { data: channel }))
}

/// DELETE /api/v1/channels/{channel_id}
///
/// Deletion is blocked while the channel has runs: the UI references
/// them and history must not silently disappear.
pub async fn delete_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let channel = find_channel(&state.pool, channel_id).await?;

    if ChannelRepo::has_runs(&state.pool, channel.id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "Cannot delete a channel with existing runs".into(),
        )));
    }

    ChannelRepo::delete(&state.pool, channel.id).await?;
    tracing::info!(channel_id = %channel_id, "Channel deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Follow
// ---------------------------------------------------------------------------

/// POST /api/v1/channels/{channel_id}/follow
///
/// Save or remove the channel on a user's profile. Idempotent in both
/// directions.
pub async fn follow_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Json(input): Json<FollowRequest>,
) -> AppResult<impl IntoResponse> {
    let channel = find_channel(&state.pool, channel_id).await?;

    ChannelRepo::set_following(
        &state.pool,
        channel.id,
        &input.email,
        input.save_channel_to_profile,
    )
    .await?;

    Ok(Json(DataResponse { data: input }))
}

// ---------------------------------------------------------------------------
// Remote actions
// ---------------------------------------------------------------------------

/// POST /api/v1/channels/{channel_id}/activate
///
/// Deploy the channel's staged tree to the live channel on its content
/// server.
pub async fn activate_channel(
    MaybeToken(token): MaybeToken,
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let channel = find_channel(&state.pool, channel_id).await?;
    let client = action_client(&state, &channel, token).await?;

    client.activate_channel(&channel.channel_id_hex()).await?;
    tracing::info!(channel_id = %channel_id, "Channel activated");

    Ok(Json(DataResponse {
        data: json!({ "success": true }),
    }))
}

/// POST /api/v1/channels/{channel_id}/publish
///
/// Ask the content server to publish the channel.
pub async fn publish_channel(
    MaybeToken(token): MaybeToken,
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let channel = find_channel(&state.pool, channel_id).await?;
    let client = action_client(&state, &channel, token).await?;

    client.publish_channel(&channel.channel_id_hex()).await?;
    tracing::info!(channel_id = %channel_id, "Channel publish requested");

    Ok(Json(DataResponse {
        data: json!({ "success": true }),
    }))
}
