//! Handlers for the `/runs` resource: run creation, the run-detail view
//! model, stat patching, and the topic-tree read path.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chefboard_core::error::CoreError;
use chefboard_core::format::{
    chef_display_name, chef_repo_link, format_cli_flags, format_hms, format_size,
};
use chefboard_core::stages::{run_failed, stage_segments, total_duration_seconds};
use chefboard_core::stats::{diff_stats, stats_map};
use chefboard_core::status::{resolve_status, staging_review_url, status_descriptor};
use chefboard_db::models::channel::Channel;
use chefboard_db::models::run::{CreateRun, CreateRunRequest, Run, UpdateRun};
use chefboard_db::repositories::{ChannelRepo, RunRepo, StageRepo};
use chefboard_studio::tree::{read_tree_cache, tree_cache_path};
use chefboard_studio::StudioClient;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::channels::find_channel;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::views::{combine_stats, decorate_tree, run_header_status, RunDetailView, RunRef};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a run by UUID or 404.
pub(crate) async fn find_run(pool: &sqlx::PgPool, run_id: Uuid) -> AppResult<Run> {
    RunRepo::find_by_id(pool, run_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Run",
            id: run_id.to_string(),
        }))
}

/// Fetch the parent channel of a run.
async fn parent_channel(pool: &sqlx::PgPool, run: &Run) -> AppResult<Channel> {
    ChannelRepo::find_by_id(pool, run.channel_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Channel",
            id: run.channel_id.to_string(),
        }))
}

/// The most recent earlier run of the same channel with no failure
/// stage, used as the diff baseline.
async fn previous_successful_run(pool: &sqlx::PgPool, run: &Run) -> AppResult<Option<Run>> {
    for candidate in RunRepo::earlier_runs(pool, run).await? {
        if !StageRepo::has_failure(pool, candidate.run_id).await? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Single-channel remote status lookup using the run's own credential.
///
/// Any failure (no token, unreachable server, unknown channel) yields
/// `None` so the caller falls back to local status.
async fn remote_status_for_run(run: &Run, channel_hex: &str) -> Option<String> {
    let client = StudioClient::new(
        run.content_server.clone(),
        run.started_by_token.clone().unwrap_or_default(),
    );
    match client
        .get_channel_status_bulk(&[channel_hex.to_string()])
        .await
    {
        Ok(mut statuses) => statuses.remove(channel_hex),
        Err(e) => {
            tracing::debug!(run_id = %run.run_id, error = %e, "Remote status lookup failed");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/runs
///
/// Register the start of a new chef run. The caller (the job itself)
/// supplies its chef name, credential, and optional content server
/// override; the server assigns the run UUID.
pub async fn create_run(
    State(state): State<AppState>,
    Json(input): Json<CreateRunRequest>,
) -> AppResult<impl IntoResponse> {
    let channel = find_channel(&state.pool, input.channel_id).await?;

    let create = CreateRun {
        run_id: Uuid::new_v4(),
        channel_id: channel.id,
        chef_name: input.chef_name,
        chef_version: input.chef_version,
        extra_options: input.extra_options,
        started_by_email: input.started_by_email,
        started_by_token: input.started_by_token,
        content_server: input
            .content_server
            .unwrap_or_else(|| channel.default_content_server.clone()),
    };
    let run = RunRepo::create(&state.pool, &create).await?;

    tracing::info!(
        run_id = %run.run_id,
        channel_id = %channel.channel_id,
        chef_name = %run.chef_name,
        "Run created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: run })))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/channels/{channel_id}/runs
pub async fn list_runs_for_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let channel = find_channel(&state.pool, channel_id).await?;
    let runs = RunRepo::list_by_channel(&state.pool, channel.id).await?;
    Ok(Json(DataResponse { data: runs }))
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

/// GET /api/v1/runs/{run_id}
///
/// The run-detail view model: stage timeline segments, stat diffs
/// against the previous successful run, and the reconciled status with
/// any suggested operator actions.
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let run = find_run(&state.pool, run_id).await?;
    let channel = parent_channel(&state.pool, &run).await?;
    let channel_hex = channel.channel_id_hex();

    let stages = StageRepo::list_by_run(&state.pool, run.run_id).await?;
    let events: Vec<_> = stages.iter().map(|s| s.to_event()).collect();
    let failed = run_failed(stages.iter().map(|s| s.name.as_str()));

    let previous = previous_successful_run(&state.pool, &run).await?;

    let remote = remote_status_for_run(&run, &channel_hex).await;
    let resolved = resolve_status(remote.as_deref(), stages.last().map(|s| s.name.as_str()));
    let actions = remote
        .as_deref()
        .and_then(|s| {
            status_descriptor(
                s,
                Some(staging_review_url(&run.content_server, &channel_hex)),
            )
        })
        .map(|d| d.actions)
        .unwrap_or_default();

    let current_counts = stats_map(run.resource_counts.as_ref());
    let previous_counts = previous.as_ref().and_then(|p| stats_map(p.resource_counts.as_ref()));
    let resource_counts = diff_stats(
        current_counts.as_ref(),
        previous_counts.as_ref(),
        |v| v.to_string(),
    );

    let current_sizes = stats_map(run.resource_sizes.as_ref());
    let previous_sizes = previous.as_ref().and_then(|p| stats_map(p.resource_sizes.as_ref()));
    let resource_sizes = diff_stats(current_sizes.as_ref(), previous_sizes.as_ref(), format_size);

    let (topic_count, combined_stats) = combine_stats(&resource_counts, &resource_sizes);

    let cache_path = tree_cache_path(
        &state.config.trees_dir,
        channel.channel_id,
        run.run_id,
        run.created_at,
    );
    let tree_cached = tokio::fs::try_exists(&cache_path).await.unwrap_or(false);

    let channel_runs = RunRepo::list_by_channel(&state.pool, channel.id)
        .await?
        .into_iter()
        .map(|r| RunRef {
            run_id: r.run_id,
            state: r.state,
            created_at: r.created_at,
        })
        .collect();

    let view = RunDetailView {
        run_id: run.run_id,
        channel_id: channel_hex,
        channel_name: channel.name.clone(),
        channel_run_status: run_header_status(
            run.has_flag("staged"),
            run.has_flag("published"),
            &resolved,
        ),
        channel_status: resolved,
        actions,
        failed,
        run_stages: stage_segments(&events),
        total_time: format_hms(total_duration_seconds(&events)),
        resource_counts,
        resource_sizes,
        topic_count,
        combined_stats,
        channel_url: channel.channel_url(),
        chef_name: chef_display_name(&run.chef_name),
        chef_link: chef_repo_link(&run.chef_name),
        cl_flags: format_cli_flags(run.extra_options.as_ref()),
        tree_cached,
        channel_runs,
    };

    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// PATCH /api/v1/runs/{run_id}
///
/// Partial update posted by the job as it finishes: resource counts,
/// sizes, extra option flags. Absent fields are left untouched.
pub async fn patch_run(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Json(input): Json<UpdateRun>,
) -> AppResult<impl IntoResponse> {
    let run = RunRepo::update(&state.pool, run_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Run",
            id: run_id.to_string(),
        }))?;

    Ok(Json(DataResponse { data: run }))
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// GET /api/v1/runs/{run_id}/tree
///
/// Serve the run's cached topic tree. When the cache file is missing
/// (build still running, or it died) this falls back to a live fetch of
/// just the root level -- deliberately without populating the cache,
/// since a root-only tree is not the full build output.
pub async fn get_run_tree(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let run = find_run(&state.pool, run_id).await?;
    let channel = parent_channel(&state.pool, &run).await?;

    let cache_path = tree_cache_path(
        &state.config.trees_dir,
        channel.channel_id,
        run.run_id,
        run.created_at,
    );

    let tree = match read_tree_cache(&cache_path).await {
        Ok(Some(tree)) => tree,
        Ok(None) => {
            let client = StudioClient::new(
                run.content_server.clone(),
                run.started_by_token.clone().unwrap_or_default(),
            );
            match client
                .get_node_tree_data(&channel.channel_id_hex(), None)
                .await
            {
                Ok(tree) => tree,
                Err(e) => {
                    tracing::warn!(run_id = %run_id, error = %e, "Live tree fetch failed");
                    Vec::new()
                }
            }
        }
        Err(e) => {
            tracing::error!(run_id = %run_id, error = %e, "Tree cache read failed");
            Vec::new()
        }
    };

    Ok(Json(DataResponse {
        data: decorate_tree(tree),
    }))
}
