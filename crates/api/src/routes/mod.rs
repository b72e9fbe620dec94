pub mod channels;
pub mod health;
pub mod runs;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /control/{channel_id}              WebSocket: chef daemon control listener
///
/// /channels                          list (dashboard cards), register
/// /channels/{channel_id}             get, delete
/// /channels/{channel_id}/follow      follow/unfollow (POST)
/// /channels/{channel_id}/activate    remote activate (POST)
/// /channels/{channel_id}/publish     remote publish (POST)
/// /channels/{channel_id}/control     admin command broadcast (POST)
/// /channels/{channel_id}/runs        run list for a channel
///
/// /runs                              create run (POST, job start)
/// /runs/{run_id}                     detail view model, patch stats
/// /runs/{run_id}/tree                cached topic tree, live fallback
/// /runs/{run_id}/stages              list, report stage completion
/// /runs/{run_id}/progress            read/write live progress
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Control channel WebSocket endpoint (chef daemons).
        .route("/control/{channel_id}", get(ws::control_ws_handler))
        // Channel registration, listing, and remote actions.
        .nest("/channels", channels::router())
        // Run lifecycle: creation, detail, stages, progress, tree.
        .nest("/runs", runs::router())
}
