//! Client for the remote content-curation server ("Studio") plus the
//! topic-tree cache builder.
//!
//! Everything the dashboard asks of Studio is best-effort: a server that
//! cannot be reached degrades to an empty result at the service boundary
//! instead of failing the request that needed it.

pub mod client;
pub mod tree;

pub use client::{StudioClient, StudioError};
pub use tree::{NodeFetcher, TreeNode};
