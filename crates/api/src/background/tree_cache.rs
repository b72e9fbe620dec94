//! Deferred tree cache build.
//!
//! Walking a large channel's tree means one remote call per internal
//! node and can take tens of seconds, so it must never run inside the
//! request/response cycle (which has a timeout budget). The terminal
//! stage handler spawns this instead. If the task dies mid-walk the
//! cache file is simply never written and readers fall back to a live
//! fetch.

use std::path::PathBuf;

use chefboard_db::models::run::Run;
use chefboard_studio::tree::{self, StudioNodeFetcher};
use chefboard_studio::StudioClient;
use uuid::Uuid;

/// Spawn the tree fetch-and-cache for a completed run.
///
/// Fire-and-forget: the handle is returned for tests but callers in the
/// request path drop it.
pub fn spawn_build(run: Run, channel_id: Uuid, trees_root: PathBuf) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let token = run.started_by_token.clone().unwrap_or_default();
        let client = StudioClient::new(run.content_server.clone(), token);
        let channel_hex = channel_id.simple().to_string();
        let fetcher = StudioNodeFetcher::new(client, channel_hex);

        tracing::info!(run_id = %run.run_id, channel_id = %channel_id, "Tree cache build started");
        let forest = tree::build_tree(&fetcher).await;

        let path = tree::tree_cache_path(&trees_root, channel_id, run.run_id, run.created_at);
        match tree::write_tree_cache(&path, &forest).await {
            Ok(()) => {
                tracing::info!(
                    run_id = %run.run_id,
                    nodes = forest.len(),
                    path = %path.display(),
                    "Tree cache build finished",
                );
            }
            Err(e) => {
                tracing::error!(run_id = %run.run_id, error = %e, "Failed to write tree cache");
            }
        }
    })
}
