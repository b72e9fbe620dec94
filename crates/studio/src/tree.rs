//! Topic-tree fetching and per-run cache files.
//!
//! The content server only hands out one level of the tree per request,
//! so assembling the full hierarchy means one RPC per internal node.
//! [`build_tree`] drives that walk with an explicit worklist (a queue of
//! node ids) rather than recursion, so pathological deep hierarchies
//! cannot exhaust the stack. The finished forest is written to a JSON
//! file keyed by channel and run; dashboard renders read the file and
//! fall back to a live root-level fetch when it is missing.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chefboard_core::types::Timestamp;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::{StudioClient, StudioError};

/// One node of the remote content hierarchy.
///
/// Internal nodes carry a `node_id` the server will expand; leaves do
/// not. `children` is only populated once a node has been expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub kind: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

/// Source of per-node child listings.
///
/// The production implementation is [`StudioNodeFetcher`]; tests inject
/// fakes to exercise the walk without a server.
#[async_trait]
pub trait NodeFetcher: Send + Sync {
    /// Fetch the children of `node_id`, or of the root when `None`.
    async fn fetch_children(&self, node_id: Option<&str>) -> Result<Vec<TreeNode>, StudioError>;
}

/// [`NodeFetcher`] backed by one channel on one content server.
pub struct StudioNodeFetcher {
    client: StudioClient,
    channel_id: String,
}

impl StudioNodeFetcher {
    pub fn new(client: StudioClient, channel_id: impl Into<String>) -> Self {
        Self {
            client,
            channel_id: channel_id.into(),
        }
    }
}

#[async_trait]
impl NodeFetcher for StudioNodeFetcher {
    async fn fetch_children(&self, node_id: Option<&str>) -> Result<Vec<TreeNode>, StudioError> {
        self.client
            .get_node_tree_data(&self.channel_id, node_id)
            .await
    }
}

/// Fetch and assemble the full tree for a channel.
///
/// Walks breadth-first from the root, expanding every child that carries
/// a `node_id`. Failures never abort the walk: a failed root fetch
/// yields an empty forest, and a failed inner fetch yields an empty
/// child list for that subtree (the partial tree is kept). Retrying is
/// the caller's decision.
pub async fn build_tree<F: NodeFetcher + ?Sized>(fetcher: &F) -> Vec<TreeNode> {
    let mut roots = match fetcher.fetch_children(None).await {
        Ok(children) => children,
        Err(e) => {
            tracing::warn!(error = %e, "Root tree fetch failed, returning empty forest");
            return Vec::new();
        }
    };

    let mut queue: VecDeque<String> = roots.iter().filter_map(|n| n.node_id.clone()).collect();
    let mut order: Vec<String> = Vec::new();
    let mut children_of: HashMap<String, Vec<TreeNode>> = HashMap::new();

    while let Some(node_id) = queue.pop_front() {
        let children = match fetcher.fetch_children(Some(&node_id)).await {
            Ok(children) => children,
            Err(e) => {
                tracing::debug!(node_id = %node_id, error = %e, "Node fetch failed, pruning subtree");
                Vec::new()
            }
        };
        for child in &children {
            if let Some(id) = &child.node_id {
                queue.push_back(id.clone());
            }
        }
        order.push(node_id.clone());
        children_of.insert(node_id, children);
    }

    // Attach deepest-first: iterating the BFS order backwards guarantees a
    // node's own children were already fully assembled before its parent
    // claims them.
    for node_id in order.iter().rev() {
        let Some(mut children) = children_of.remove(node_id) else {
            continue;
        };
        for child in &mut children {
            if let Some(id) = &child.node_id {
                child.children = Some(children_of.remove(id).unwrap_or_default());
            }
        }
        children_of.insert(node_id.clone(), children);
    }

    for root in &mut roots {
        if let Some(id) = &root.node_id {
            root.children = Some(children_of.remove(id).unwrap_or_default());
        }
    }
    roots
}

/// Cache file location for a run's tree.
///
/// Layout: `<trees_root>/<channel_hex>/<year>-<month>/<run_hex>.json`.
/// The year-month partition exists only to keep any single directory
/// from growing unbounded.
pub fn tree_cache_path(
    trees_root: &Path,
    channel_id: Uuid,
    run_id: Uuid,
    run_created_at: Timestamp,
) -> PathBuf {
    let subfolder = format!("{}-{}", run_created_at.year(), run_created_at.month());
    trees_root
        .join(channel_id.simple().to_string())
        .join(subfolder)
        .join(format!("{}.json", run_id.simple()))
}

/// Serialize a forest to its cache file, creating parent directories.
pub async fn write_tree_cache(path: &Path, tree: &[TreeNode]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let data =
        serde_json::to_vec(tree).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    tokio::fs::write(path, data).await
}

/// Read a cached forest.
///
/// `Ok(None)` means the cache file does not exist (the build never ran
/// or died mid-walk) and the caller should fall back to a live fetch.
pub async fn read_tree_cache(path: &Path) -> io::Result<Option<Vec<TreeNode>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let tree = serde_json::from_slice(&bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            Ok(Some(tree))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{TimeZone, Utc};

    use super::*;

    fn topic(title: &str, node_id: &str) -> TreeNode {
        TreeNode {
            kind: "topic".to_string(),
            title: title.to_string(),
            file_size: None,
            count: None,
            node_id: Some(node_id.to_string()),
            children: None,
        }
    }

    fn leaf(kind: &str, title: &str, file_size: i64) -> TreeNode {
        TreeNode {
            kind: kind.to_string(),
            title: title.to_string(),
            file_size: Some(file_size),
            count: None,
            node_id: None,
            children: None,
        }
    }

    /// In-memory fetcher: root children plus a per-node child map, with
    /// configurable connection failures.
    struct FakeFetcher {
        roots: Vec<TreeNode>,
        children: HashMap<String, Vec<TreeNode>>,
        fail_root: bool,
        fail_nodes: HashSet<String>,
    }

    impl FakeFetcher {
        fn new(roots: Vec<TreeNode>) -> Self {
            Self {
                roots,
                children: HashMap::new(),
                fail_root: false,
                fail_nodes: HashSet::new(),
            }
        }

        fn with_children(mut self, node_id: &str, children: Vec<TreeNode>) -> Self {
            self.children.insert(node_id.to_string(), children);
            self
        }
    }

    #[async_trait]
    impl NodeFetcher for FakeFetcher {
        async fn fetch_children(
            &self,
            node_id: Option<&str>,
        ) -> Result<Vec<TreeNode>, StudioError> {
            match node_id {
                None if self.fail_root => {
                    Err(StudioError::Connection("connection refused".to_string()))
                }
                None => Ok(self.roots.clone()),
                Some(id) if self.fail_nodes.contains(id) => {
                    Err(StudioError::Connection("connection refused".to_string()))
                }
                Some(id) => Ok(self.children.get(id).cloned().unwrap_or_default()),
            }
        }
    }

    #[tokio::test]
    async fn failed_root_fetch_returns_empty_forest() {
        let mut fetcher = FakeFetcher::new(vec![topic("Maths", "a1")]);
        fetcher.fail_root = true;

        let forest = build_tree(&fetcher).await;
        assert!(forest.is_empty());
    }

    #[tokio::test]
    async fn internal_nodes_are_expanded_and_leaves_kept_as_is() {
        let fetcher = FakeFetcher::new(vec![topic("Maths", "a1"), leaf("html5", "Intro", 145990)])
            .with_children("a1", vec![leaf("exercise", "Fractions", 2048)]);

        let forest = build_tree(&fetcher).await;
        assert_eq!(forest.len(), 2);

        let maths = &forest[0];
        let children = maths.children.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].title, "Fractions");

        // The leaf root is untouched: no children field at all.
        assert!(forest[1].children.is_none());
    }

    #[tokio::test]
    async fn deep_chains_assemble_bottom_up() {
        let fetcher = FakeFetcher::new(vec![topic("Root", "a")])
            .with_children("a", vec![topic("Mid", "b")])
            .with_children("b", vec![topic("Deep", "c")])
            .with_children("c", vec![leaf("video", "Clip", 999)]);

        let forest = build_tree(&fetcher).await;
        let mid = &forest[0].children.as_ref().unwrap()[0];
        let deep = &mid.children.as_ref().unwrap()[0];
        let clip = &deep.children.as_ref().unwrap()[0];
        assert_eq!(clip.title, "Clip");
    }

    #[tokio::test]
    async fn failed_subtree_is_pruned_not_fatal() {
        let mut fetcher = FakeFetcher::new(vec![topic("Good", "g"), topic("Bad", "b")])
            .with_children("g", vec![leaf("video", "Clip", 1)]);
        fetcher.fail_nodes.insert("b".to_string());

        let forest = build_tree(&fetcher).await;
        assert_eq!(forest[0].children.as_ref().unwrap().len(), 1);
        // Pruned subtree: expanded to an empty child list.
        assert_eq!(forest[1].children.as_ref().unwrap().len(), 0);
    }

    #[test]
    fn cache_path_partitions_by_channel_and_month() {
        let channel = Uuid::parse_str("f6268483-da1e-5a24-a38a-80456b7d4cb5").unwrap();
        let run = Uuid::parse_str("01020304-0506-0708-090a-0b0c0d0e0f10").unwrap();
        let created = Utc.with_ymd_and_hms(2023, 4, 17, 9, 30, 0).unwrap();

        let path = tree_cache_path(Path::new("/var/trees"), channel, run, created);
        assert_eq!(
            path,
            PathBuf::from(
                "/var/trees/f6268483da1e5a24a38a80456b7d4cb5/2023-4/0102030405060708090a0b0c0d0e0f10.json"
            )
        );
    }

    #[tokio::test]
    async fn cache_round_trips_and_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ch").join("2023-4").join("run.json");

        assert!(read_tree_cache(&path).await.unwrap().is_none());

        let forest = vec![topic("Maths", "a1"), leaf("video", "Clip", 77)];
        write_tree_cache(&path, &forest).await.unwrap();

        let loaded = read_tree_cache(&path).await.unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].title, "Maths");
        assert_eq!(loaded[1].file_size, Some(77));
    }
}
