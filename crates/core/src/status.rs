//! Channel status reconciliation.
//!
//! Two sources of truth exist for a channel's status: the remote
//! content-curation server (authoritative when reachable) and the local
//! stage history (fallback). [`resolve_status`] applies the precedence;
//! [`status_descriptor`] maps a remote status string to the operator-facing
//! descriptor with helper text and suggested actions.

use serde::Serialize;

use crate::stages::display_stage_name;

/// Remote statuses reported by the content server's bulk query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Deleted,
    Staged,
    Unpublished,
    Active,
    Building,
}

impl RemoteStatus {
    /// Parse a status string from the bulk query. Unknown values are
    /// `None`, not an error -- the server may grow new statuses.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "deleted" => Some(Self::Deleted),
            "staged" => Some(Self::Staged),
            "unpublished" => Some(Self::Unpublished),
            "active" => Some(Self::Active),
            "building" => Some(Self::Building),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::Staged => "staged",
            Self::Unpublished => "unpublished",
            Self::Active => "active",
            Self::Building => "building",
        }
    }
}

/// A suggested operator action attached to a status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusAction {
    pub action_text: &'static str,
    pub url: String,
}

/// Operator-facing rendering of a remote channel status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusDescriptor {
    pub name: &'static str,
    pub helper: &'static str,
    pub actions: Vec<StatusAction>,
}

/// The review URL for a staged channel on its content server.
pub fn staging_review_url(content_server: &str, channel_id_hex: &str) -> String {
    format!("{content_server}/channels/{channel_id_hex}/staging")
}

/// Map a remote status string to its display descriptor.
///
/// `staging_url` feeds the "Review Channel" action of the staged state.
/// Unknown status strings yield `None`; callers must tolerate an absent
/// descriptor.
pub fn status_descriptor(status: &str, staging_url: Option<String>) -> Option<StatusDescriptor> {
    let descriptor = match RemoteStatus::parse(status)? {
        RemoteStatus::Deleted => StatusDescriptor {
            name: "Deleted",
            helper: "Channel has been deleted",
            actions: Vec::new(),
        },
        RemoteStatus::Staged => StatusDescriptor {
            name: "Needs Review",
            helper: "Channel is currently staged",
            actions: staging_url
                .map(|url| {
                    vec![StatusAction {
                        action_text: "Review Channel",
                        url,
                    }]
                })
                .unwrap_or_default(),
        },
        RemoteStatus::Unpublished => StatusDescriptor {
            name: "Needs Publishing",
            helper: "Channel has unpublished updates",
            actions: Vec::new(),
        },
        RemoteStatus::Active => StatusDescriptor {
            name: "Active",
            helper: "Channel is active",
            actions: Vec::new(),
        },
        RemoteStatus::Building => StatusDescriptor {
            name: "Building...",
            helper: "Building topic tree for this channel",
            actions: Vec::new(),
        },
    };
    Some(descriptor)
}

/// Merge remote and local status into the single string shown to operators.
///
/// The remote bulk-query entry wins when present. Without one (query
/// failed, returned nothing, or the caller had no credential) the status
/// falls back to the latest completed stage name, or `"created"` for a
/// run with no stage events yet.
pub fn resolve_status(remote: Option<&str>, latest_stage_name: Option<&str>) -> String {
    if let Some(status) = remote {
        return status.to_string();
    }
    match latest_stage_name {
        Some(name) => display_stage_name(name),
        None => "created".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_descriptor_links_to_staging_review() {
        let channel_hex = "f6268483da1e5a24a38a80456b7d4cb5";
        let url = staging_review_url("https://studio.example.com", channel_hex);
        let descriptor = status_descriptor("staged", Some(url)).unwrap();

        assert_eq!(descriptor.name, "Needs Review");
        assert_eq!(descriptor.actions.len(), 1);
        assert!(descriptor.actions[0]
            .url
            .contains("/channels/f6268483da1e5a24a38a80456b7d4cb5/staging"));
    }

    #[test]
    fn unknown_status_has_no_descriptor() {
        assert!(status_descriptor("sideloaded", None).is_none());
    }

    #[test]
    fn remote_entry_is_authoritative() {
        assert_eq!(
            resolve_status(Some("staged"), Some("Status.DOWNLOADING")),
            "staged"
        );
    }

    #[test]
    fn missing_remote_entry_falls_back_to_stage_name() {
        assert_eq!(
            resolve_status(None, Some("Status.DOWNLOADING")),
            "DOWNLOADING"
        );
    }

    #[test]
    fn no_stages_means_created() {
        assert_eq!(resolve_status(None, None), "created");
    }

    #[test]
    fn known_statuses_round_trip() {
        for s in ["deleted", "staged", "unpublished", "active", "building"] {
            assert_eq!(RemoteStatus::parse(s).unwrap().as_str(), s);
        }
    }
}
