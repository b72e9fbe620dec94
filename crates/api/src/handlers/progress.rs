//! Live run-progress read/write endpoints.
//!
//! The running job POSTs its fractional progress here; the dashboard
//! polls the GET side. Values live in the external progress store, not
//! the database.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::runs::find_run;
use crate::progress::RunProgress;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/runs/{run_id}/progress
///
/// Current progress for a run. A run nothing has reported yet reads as
/// zero progress rather than an error.
pub async fn get_progress(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let run = find_run(&state.pool, run_id).await?;

    let progress = state
        .progress
        .get(run.run_id)
        .await
        .map_err(|e| AppError::InternalError(format!("progress store read failed: {e}")))?
        .unwrap_or(RunProgress { progress: 0.0 });

    Ok(Json(DataResponse { data: progress }))
}

/// POST /api/v1/runs/{run_id}/progress
///
/// Store a progress update. Last write wins; there is no locking.
pub async fn post_progress(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Json(input): Json<RunProgress>,
) -> AppResult<impl IntoResponse> {
    let run = find_run(&state.pool, run_id).await?;

    if !input.progress.is_finite() || !(0.0..=1.0).contains(&input.progress) {
        return Err(AppError::BadRequest(
            "progress must be a fraction between 0 and 1".into(),
        ));
    }

    state
        .progress
        .set(run.run_id, &input)
        .await
        .map_err(|e| AppError::InternalError(format!("progress store write failed: {e}")))?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: input })))
}
