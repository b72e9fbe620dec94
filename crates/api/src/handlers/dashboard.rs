//! The dashboard channel listing.
//!
//! One request assembles every channel card: local run/stage state from
//! the database, live progress from the progress store, listener
//! activity from the control hub, and remote status from the content
//! servers. Remote lookups are batched per distinct server and degrade
//! to "unknown" when a server is unreachable.

use std::collections::HashMap;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chefboard_core::format::{chef_display_name, chef_repo_link, format_cli_flags, format_hms};
use chefboard_core::stages::{progress_percent, run_failed, total_duration_seconds};
use chefboard_core::status::{resolve_status, staging_review_url, status_descriptor};
use chefboard_db::models::channel::Channel;
use chefboard_db::models::run::Run;
use chefboard_db::repositories::{ChannelRepo, RunRepo, StageRepo};
use chefboard_studio::StudioClient;

use crate::error::AppResult;
use crate::middleware::auth::MaybeToken;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::views::{group_channels_by_server, ChannelSummary};

/// GET /api/v1/channels
///
/// List every channel as a dashboard card, most recently active first.
pub async fn list_channels(
    MaybeToken(token): MaybeToken,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let channels = ChannelRepo::list_all(&state.pool).await?;

    let mut latest_runs = Vec::with_capacity(channels.len());
    for channel in &channels {
        latest_runs.push(RunRepo::latest_for_channel(&state.pool, channel.id).await?);
    }

    let status_mapping = fetch_status_mapping(&channels, &latest_runs, token.as_deref()).await;

    let mut summaries = Vec::with_capacity(channels.len());
    for (channel, last_run) in channels.into_iter().zip(latest_runs) {
        summaries.push(build_summary(&state, channel, last_run, &status_mapping).await?);
    }

    Ok(Json(DataResponse { data: summaries }))
}

/// Query every involved content server once for the statuses of the
/// channels it hosts.
///
/// Without a caller credential no queries are made at all (everything
/// falls back to local status). A failed batch only degrades its own
/// channels; the other batches still apply.
async fn fetch_status_mapping(
    channels: &[Channel],
    latest_runs: &[Option<Run>],
    token: Option<&str>,
) -> HashMap<String, String> {
    let mut mapping = HashMap::new();
    let Some(token) = token else {
        return mapping;
    };

    let pairs: Vec<(String, Option<String>)> = channels
        .iter()
        .zip(latest_runs)
        .map(|(channel, run)| {
            (
                channel.channel_id_hex(),
                run.as_ref().map(|r| r.content_server.clone()),
            )
        })
        .collect();

    for (server, channel_ids) in group_channels_by_server(&pairs) {
        let client = StudioClient::new(server.clone(), token);
        match client.get_channel_status_bulk(&channel_ids).await {
            Ok(statuses) => mapping.extend(statuses),
            Err(e) => {
                tracing::warn!(
                    server = %server,
                    batch_size = channel_ids.len(),
                    error = %e,
                    "Bulk status query failed, batch degrades to unknown",
                );
            }
        }
    }
    mapping
}

/// Assemble one channel card.
async fn build_summary(
    state: &AppState,
    channel: Channel,
    last_run: Option<Run>,
    status_mapping: &HashMap<String, String>,
) -> AppResult<ChannelSummary> {
    let hex = channel.channel_id_hex();
    let followers = ChannelRepo::followers(&state.pool, channel.id).await?;
    let active = state.control_hub.listener_count(&hex).await > 0;

    // A channel that has never run shows as "New" with no run metadata.
    let Some(run) = last_run else {
        return Ok(ChannelSummary {
            id: hex,
            channel: channel.name.clone(),
            status: "New".to_string(),
            ccstatus: None,
            status_pct: 0,
            run_status: "success",
            active,
            channel_url: channel.channel_url(),
            spec_sheet_url: channel.spec_sheet_url,
            chef_repo_url: channel.chef_repo_url,
            followers,
            last_run_id: None,
            last_run_date: None,
            duration: None,
            chef_name: None,
            chef_link: None,
            cl_flags: None,
        });
    };

    let stages = StageRepo::list_by_run(&state.pool, run.run_id).await?;
    let failed = run_failed(stages.iter().map(|s| s.name.as_str()));

    // The progress store is best-effort on the listing: an unreachable
    // cache shows 0%, not an error page.
    let progress = state.progress.get(run.run_id).await.ok().flatten();

    let events: Vec<_> = stages.iter().map(|s| s.to_event()).collect();
    let latest_stage = stages.last().map(|s| s.name.as_str());
    let remote = status_mapping.get(&hex).map(String::as_str);

    let status = if failed {
        "Failed".to_string()
    } else {
        resolve_status(remote, latest_stage)
    };
    let ccstatus = remote
        .and_then(|s| status_descriptor(s, Some(staging_review_url(&run.content_server, &hex))));

    Ok(ChannelSummary {
        id: hex,
        channel: channel.name.clone(),
        status,
        ccstatus,
        status_pct: progress_percent(progress.map(|p| p.progress), failed),
        run_status: if failed { "danger" } else { "success" },
        active,
        channel_url: channel.channel_url(),
        spec_sheet_url: channel.spec_sheet_url,
        chef_repo_url: channel.chef_repo_url,
        followers,
        last_run_id: Some(run.run_id),
        last_run_date: stages
            .last()
            .map(|s| s.finished.format("%b %d, %H:%M").to_string()),
        duration: Some(format_hms(total_duration_seconds(&events))),
        chef_name: Some(chef_display_name(&run.chef_name)),
        chef_link: Some(chef_repo_link(&run.chef_name)),
        cl_flags: Some(format_cli_flags(run.extra_options.as_ref())),
    })
}
