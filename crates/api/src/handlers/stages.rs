//! Stage-completion reporting: the write side of the run state machine.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chefboard_core::stages::TERMINAL_STAGE;
use chefboard_db::models::channel::Channel;
use chefboard_db::models::run::Run;
use chefboard_db::models::stage::ReportStageRequest;
use chefboard_db::repositories::{ChannelRepo, RunRepo, StageRepo};
use chefboard_studio::StudioClient;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::background;
use crate::error::{AppError, AppResult};
use crate::handlers::runs::find_run;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/runs/{run_id}/stages
///
/// List a run's completed stages in chronological order.
pub async fn list_stages(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let run = find_run(&state.pool, run_id).await?;
    let stages = StageRepo::list_by_run(&state.pool, run.run_id).await?;
    Ok(Json(DataResponse { data: stages }))
}

/// POST /api/v1/runs/{run_id}/stages
///
/// Record a completed stage. Ordering trusts the server clock: the
/// finish time is the receipt time, and the start time is derived by
/// subtracting the job's claimed duration. Recording the terminal stage
/// additionally refreshes the run's staged/published flags from the
/// content server and kicks off the deferred tree cache build.
pub async fn report_stage(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Json(input): Json<ReportStageRequest>,
) -> AppResult<impl IntoResponse> {
    let run = find_run(&state.pool, run_id).await?;

    if !input.duration_seconds.is_finite() || input.duration_seconds < 0.0 {
        return Err(AppError::BadRequest(
            "duration_seconds must be a non-negative number".into(),
        ));
    }

    let finished = Utc::now();
    let started = finished - chrono::Duration::milliseconds((input.duration_seconds * 1000.0) as i64);

    let stage = StageRepo::create(
        &state.pool,
        run.run_id,
        &input.stage,
        started,
        finished,
        input.duration_seconds,
    )
    .await?;

    // The run's overall state mirrors its most recent stage.
    RunRepo::set_state(&state.pool, run.run_id, &stage.name).await?;

    if stage.name == TERMINAL_STAGE {
        let channel = ChannelRepo::find_by_id(&state.pool, run.channel_id).await?;
        if let Some(channel) = channel {
            refresh_run_flags(&state, &run, &channel).await;

            // The full tree walk takes tens of seconds on large
            // channels; it runs on a detached task, never in-request.
            let _ = background::tree_cache::spawn_build(
                run.clone(),
                channel.channel_id,
                state.config.trees_dir.clone(),
            );
        }

        tracing::info!(run_id = %run.run_id, "Run completed");
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: stage })))
}

/// Refresh the run's cached staged/published flags from the content
/// server's status. Best-effort: an unreachable server leaves the flags
/// as they were.
async fn refresh_run_flags(state: &AppState, run: &Run, channel: &Channel) {
    let client = StudioClient::new(
        run.content_server.clone(),
        run.started_by_token.clone().unwrap_or_default(),
    );
    let channel_hex = channel.channel_id_hex();

    let status = match client
        .get_channel_status_bulk(&[channel_hex.clone()])
        .await
    {
        Ok(mut statuses) => statuses.remove(&channel_hex),
        Err(e) => {
            tracing::warn!(run_id = %run.run_id, error = %e, "Status refresh failed, keeping flags");
            return;
        }
    };

    let mut options = match run.extra_options.clone() {
        Some(value) if value.is_object() => value,
        _ => json!({}),
    };
    options["staged"] = json!(status.as_deref() == Some("staged"));
    options["published"] = json!(status.as_deref() == Some("published"));

    if let Err(e) = RunRepo::set_extra_options(&state.pool, run.run_id, &options).await {
        tracing::error!(run_id = %run.run_id, error = %e, "Failed to persist refreshed flags");
    }
}
