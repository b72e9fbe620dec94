//! Route definitions for the `/channels` resource.
//!
//! ```text
//! GET    /                          list_channels (dashboard cards)
//! POST   /                          create_channel
//! GET    /{channel_id}              get_channel
//! DELETE /{channel_id}              delete_channel (409 while runs exist)
//! POST   /{channel_id}/follow       follow_channel
//! POST   /{channel_id}/activate     activate_channel (remote action)
//! POST   /{channel_id}/publish      publish_channel (remote action)
//! POST   /{channel_id}/control      broadcast_command (admin only)
//! GET    /{channel_id}/runs         list_runs_for_channel
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{channels, control, dashboard, runs};
use crate::state::AppState;

/// Channel routes -- mounted at `/channels`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(dashboard::list_channels).post(channels::create_channel),
        )
        .route(
            "/{channel_id}",
            get(channels::get_channel).delete(channels::delete_channel),
        )
        .route("/{channel_id}/follow", post(channels::follow_channel))
        .route("/{channel_id}/activate", post(channels::activate_channel))
        .route("/{channel_id}/publish", post(channels::publish_channel))
        .route("/{channel_id}/control", post(control::broadcast_command))
        .route("/{channel_id}/runs", get(runs::list_runs_for_channel))
}
