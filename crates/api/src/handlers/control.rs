//! Admin broadcast of control commands to listening chef daemons.

use axum::extract::ws::Message;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::channels::find_channel;
use crate::middleware::auth::AdminAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// A command for whichever chef daemon is listening on the channel's
/// control topic: a name, positional args, and an options map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlCommand {
    pub command: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// POST /api/v1/channels/{channel_id}/control
///
/// Broadcast a command to the channel's control listeners. Admin only.
/// The response reports how many listeners received it; zero listeners
/// is not an error (the daemon may simply be down).
pub async fn broadcast_command(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Json(input): Json<ControlCommand>,
) -> AppResult<impl IntoResponse> {
    let channel = find_channel(&state.pool, channel_id).await?;

    let text = serde_json::to_string(&input)
        .map_err(|e| AppError::InternalError(format!("command serialization failed: {e}")))?;

    let listeners = state
        .control_hub
        .broadcast(&channel.channel_id_hex(), Message::Text(text.into()))
        .await;

    tracing::info!(
        channel_id = %channel_id,
        command = %input.command,
        listeners,
        "Control command broadcast",
    );

    Ok(Json(DataResponse {
        data: json!({ "command": input.command, "listeners": listeners }),
    }))
}
