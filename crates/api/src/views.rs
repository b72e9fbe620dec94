//! View models served to the dashboard frontend.
//!
//! Handlers gather rows from the repositories and remote statuses from
//! the content server, then delegate to the pure assembly helpers here.
//! Everything in this module is computation over already-fetched data,
//! so it carries the unit tests for the trickier merge logic.

use std::collections::HashMap;

use chefboard_core::format::format_size;
use chefboard_core::stages::StageSegment;
use chefboard_core::stats::{resource_icon, StatRow};
use chefboard_core::status::{StatusAction, StatusDescriptor};
use chefboard_core::types::Timestamp;
use chefboard_studio::TreeNode;
use serde::Serialize;
use uuid::Uuid;

/// One channel card on the dashboard listing.
#[derive(Debug, Serialize)]
pub struct ChannelSummary {
    /// Public channel id, hex form.
    pub id: String,
    pub channel: String,
    /// Reconciled status string (remote wins, local stage fallback).
    pub status: String,
    /// Remote status descriptor when the bulk query knew the channel.
    pub ccstatus: Option<StatusDescriptor>,
    pub status_pct: u8,
    /// Bar color class: "danger" for failed runs, "success" otherwise.
    pub run_status: &'static str,
    /// Whether a chef daemon is listening for control commands.
    pub active: bool,
    pub channel_url: String,
    pub spec_sheet_url: Option<String>,
    pub chef_repo_url: Option<String>,
    pub followers: Vec<String>,
    pub last_run_id: Option<Uuid>,
    pub last_run_date: Option<String>,
    pub duration: Option<String>,
    pub chef_name: Option<String>,
    pub chef_link: Option<String>,
    pub cl_flags: Option<String>,
}

/// A sibling run reference for the run-detail navigation list.
#[derive(Debug, Serialize)]
pub struct RunRef {
    pub run_id: Uuid,
    pub state: Option<String>,
    pub created_at: Timestamp,
}

/// A count row paired with its size row for the combined stats table.
#[derive(Debug, Serialize)]
pub struct CombinedStat {
    pub name: String,
    pub icon: &'static str,
    pub count: StatRow,
    pub size: Option<StatRow>,
}

/// The run-detail page payload.
#[derive(Debug, Serialize)]
pub struct RunDetailView {
    pub run_id: Uuid,
    pub channel_id: String,
    pub channel_name: String,
    /// Reconciled status string shown in the header.
    pub channel_status: String,
    /// Header status with the run's own staged/published flags applied.
    pub channel_run_status: String,
    pub actions: Vec<StatusAction>,
    pub failed: bool,
    pub run_stages: Vec<StageSegment>,
    pub total_time: String,
    pub resource_counts: Vec<StatRow>,
    pub resource_sizes: Vec<StatRow>,
    pub topic_count: Option<StatRow>,
    pub combined_stats: Vec<CombinedStat>,
    pub channel_url: String,
    pub chef_name: String,
    pub chef_link: String,
    pub cl_flags: String,
    /// Whether the tree cache file exists for this run.
    pub tree_cached: bool,
    pub channel_runs: Vec<RunRef>,
}

/// A display-decorated tree node: icon attached, sizes humanized.
#[derive(Debug, Serialize)]
pub struct TreeNodeView {
    pub kind: String,
    pub title: String,
    pub icon: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNodeView>>,
}

/// Group channels by the content server their latest run used.
///
/// Input pairs are `(channel_id_hex, content_server)`; channels without
/// a run (no server) are skipped. One bulk status request is then made
/// per distinct server, keeping request counts proportional to servers
/// rather than channels.
pub fn group_channels_by_server(
    pairs: &[(String, Option<String>)],
) -> HashMap<String, Vec<String>> {
    let mut by_server: HashMap<String, Vec<String>> = HashMap::new();
    for (channel_hex, server) in pairs {
        if let Some(server) = server {
            by_server
                .entry(server.clone())
                .or_default()
                .push(channel_hex.clone());
        }
    }
    by_server
}

/// Split the count rows into the topic row and per-kind combined rows,
/// pairing each remaining count with its size row by kind name.
pub fn combine_stats(
    counts: &[StatRow],
    sizes: &[StatRow],
) -> (Option<StatRow>, Vec<CombinedStat>) {
    let mut topic_count = None;
    let mut combined = Vec::new();
    for count in counts {
        if count.name == "topic" {
            topic_count = Some(count.clone());
            continue;
        }
        combined.push(CombinedStat {
            name: count.name.clone(),
            icon: count.icon,
            count: count.clone(),
            size: sizes.iter().find(|s| s.name == count.name).cloned(),
        });
    }
    (topic_count, combined)
}

/// Header status for a run: its own published/staged flags win over the
/// reconciled channel status.
pub fn run_header_status(staged: bool, published: bool, resolved_status: &str) -> String {
    if published {
        "published".to_string()
    } else if staged {
        "staged".to_string()
    } else {
        resolved_status.to_string()
    }
}

/// Decorate a raw tree for display: attach kind icons and humanize
/// file sizes, recursively.
pub fn decorate_tree(nodes: Vec<TreeNode>) -> Vec<TreeNodeView> {
    nodes
        .into_iter()
        .map(|node| TreeNodeView {
            icon: resource_icon(&node.kind),
            kind: node.kind,
            title: node.title,
            file_size: node.file_size.map(format_size),
            count: node.count,
            children: node.children.map(decorate_tree),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chefboard_core::stats::{diff_stats, StatDelta};

    use super::*;

    fn rows(pairs: &[(&str, i64)]) -> Vec<StatRow> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<std::collections::BTreeMap<_, _>>();
        diff_stats(Some(&map), None, |v| v.to_string())
    }

    #[test]
    fn grouping_is_per_server_and_skips_runless_channels() {
        let pairs = vec![
            ("aaa".to_string(), Some("https://studio-a".to_string())),
            ("bbb".to_string(), Some("https://studio-b".to_string())),
            ("ccc".to_string(), Some("https://studio-a".to_string())),
            ("ddd".to_string(), None),
        ];
        let grouped = group_channels_by_server(&pairs);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["https://studio-a"], vec!["aaa", "ccc"]);
        assert_eq!(grouped["https://studio-b"], vec!["bbb"]);
    }

    #[test]
    fn topic_count_is_split_out_of_combined_stats() {
        let counts = rows(&[("topic", 4), ("video", 10)]);
        let sizes = rows(&[("video", 1024)]);

        let (topic, combined) = combine_stats(&counts, &sizes);
        assert_eq!(topic.unwrap().value, "4");
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].name, "video");
        assert_eq!(combined[0].size.as_ref().unwrap().value, "1024");
    }

    #[test]
    fn combined_stats_tolerate_missing_size_rows() {
        let counts = rows(&[("exercise", 3)]);
        let (_, combined) = combine_stats(&counts, &[]);
        assert!(combined[0].size.is_none());
        assert_eq!(combined[0].count.delta, StatDelta::Increased);
    }

    #[test]
    fn run_flags_override_resolved_status() {
        assert_eq!(run_header_status(true, false, "active"), "staged");
        assert_eq!(run_header_status(true, true, "active"), "published");
        assert_eq!(run_header_status(false, false, "active"), "active");
    }

    #[test]
    fn tree_decoration_formats_sizes_and_recurses() {
        let tree = vec![TreeNode {
            kind: "topic".to_string(),
            title: "Maths".to_string(),
            file_size: None,
            count: None,
            node_id: Some("a".to_string()),
            children: Some(vec![TreeNode {
                kind: "video".to_string(),
                title: "Clip".to_string(),
                file_size: Some(1048576),
                count: None,
                node_id: None,
                children: None,
            }]),
        }];

        let views = decorate_tree(tree);
        assert_eq!(views[0].icon, "fa-folder");
        let child = &views[0].children.as_ref().unwrap()[0];
        assert_eq!(child.icon, "fa-video-camera");
        assert_eq!(child.file_size.as_deref(), Some("1.0MB"));
    }
}
