//! Route definitions for the `/runs` resource.
//!
//! ```text
//! POST  /                      create_run (job start)
//! GET   /{run_id}              get_run (detail view model)
//! PATCH /{run_id}              patch_run (stats, flags)
//! GET   /{run_id}/tree         get_run_tree (cache, live fallback)
//! GET   /{run_id}/stages       list_stages
//! POST  /{run_id}/stages       report_stage
//! GET   /{run_id}/progress     get_progress
//! POST  /{run_id}/progress     post_progress
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{progress, runs, stages};
use crate::state::AppState;

/// Run routes -- mounted at `/runs`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(runs::create_run))
        .route("/{run_id}", get(runs::get_run).patch(runs::patch_run))
        .route("/{run_id}/tree", get(runs::get_run_tree))
        .route(
            "/{run_id}/stages",
            get(stages::list_stages).post(stages::report_stage),
        )
        .route(
            "/{run_id}/progress",
            get(progress::get_progress).post(progress::post_progress),
        )
}
