use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use crate::state::AppState;
use crate::ws::hub::ControlHub;

/// HTTP handler that upgrades a control-channel connection to WebSocket.
///
/// The path carries the channel UUID whose commands this listener
/// wants; topics are keyed by the normalized hex form so broadcasters
/// and listeners agree regardless of hyphenation. After the upgrade
/// the connection is registered with [`ControlHub`] and managed by two
/// tasks (sender + receiver).
pub async fn control_ws_handler(
    ws: WebSocketUpgrade,
    Path(channel_id): Path<uuid::Uuid>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let topic = channel_id.simple().to_string();
    ws.on_upgrade(move |socket| handle_socket(socket, topic, state.control_hub))
}

/// Manage a single control listener connection after upgrade.
///
/// 1. Registers the connection on the channel's topic (evicting any
///    previously connected listener).
/// 2. Spawns a sender task that forwards hub messages to the sink.
/// 3. Re-broadcasts inbound text frames to the topic, so a daemon can
///    answer commands in a way its siblings (and dashboards) observe.
/// 4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, channel_id: String, hub: Arc<ControlHub>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(channel_id = %channel_id, conn_id = %conn_id, "Control listener connected");

    let mut rx = hub.subscribe(&channel_id, conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward topic messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "Control sink closed");
                break;
            }
        }
    });

    // Receiver loop: process inbound messages.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Text(text)) => {
                tracing::debug!(channel_id = %channel_id, "Control message received");
                hub.broadcast(&channel_id, Message::Text(text)).await;
            }
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "Control receive error");
                break;
            }
        }
    }

    // Clean up: remove the listener and abort the sender task.
    hub.unsubscribe(&channel_id, &conn_id).await;
    send_task.abort();
    tracing::info!(channel_id = %channel_id, conn_id = %conn_id, "Control listener disconnected");
}
