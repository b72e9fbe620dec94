//! REST client for the content server's internal API.
//!
//! Wraps the `api/internal` endpoints (node tree data, bulk status,
//! publish/activate/finish, staged checks, tree comparison) using
//! [`reqwest`]. All endpoints are token-authenticated POSTs returning
//! JSON.

use std::collections::HashMap;

use serde::Deserialize;

use crate::tree::TreeNode;

/// HTTP client for a single content server instance.
pub struct StudioClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

/// Errors from the content server client.
///
/// `Connection` covers every network-level failure (DNS, refused, timed
/// out); callers at the service boundary are expected to degrade on it
/// rather than propagate.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// No credential was available; checked before any network call.
    #[error("no token: a content server credential is required")]
    NoToken,

    /// The request never produced a response.
    #[error("connection error: could not reach the content server: {0}")]
    Connection(String),

    /// The server responded with a non-2xx status.
    #[error("content server error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The server responded 2xx but the body was not the expected shape.
    #[error("unexpected content server response: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct TreeDataResponse {
    #[serde(default)]
    tree: Vec<TreeNode>,
}

#[derive(Debug, Deserialize)]
struct BulkStatusResponse {
    #[serde(default)]
    statuses: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct AuthenticateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    username: String,
}

#[derive(Debug, Deserialize)]
struct FinishResponse {
    new_channel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StagedResponse {
    #[serde(default)]
    staged: bool,
}

/// A node entry in a tree comparison result.
#[derive(Debug, Clone, Deserialize)]
pub struct ComparedNode {
    pub title: String,
    pub kind: String,
    #[serde(default)]
    pub file_size: Option<i64>,
}

/// New and deleted nodes between a channel's current and previous tree.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeComparison {
    #[serde(default)]
    pub new: HashMap<String, ComparedNode>,
    #[serde(default)]
    pub deleted: HashMap<String, ComparedNode>,
}

impl StudioClient {
    /// Create a client for one content server.
    ///
    /// * `base_url` - e.g. `https://studio.example.com`. A trailing slash
    ///   is stripped so endpoint paths concatenate cleanly.
    /// * `token`    - the credential sent as `Authorization: Token <t>`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    /// Create a client reusing an existing [`reqwest::Client`] (connection
    /// pooling across servers).
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http,
            base_url,
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Verify the configured token against the content server.
    ///
    /// Returns the account email/username on success.
    pub async fn authenticate_user(&self) -> Result<String, StudioError> {
        let response: AuthenticateResponse = self
            .post_json("authenticate_user_internal", &serde_json::json!({}))
            .await?;
        if !response.success {
            return Err(StudioError::Api {
                status: 403,
                body: "token not recognized".to_string(),
            });
        }
        Ok(response.username)
    }

    /// Fetch the children of one node of a channel's tree.
    ///
    /// `node_id = None` fetches the root level. Leaf children come back
    /// without a `node_id` of their own.
    pub async fn get_node_tree_data(
        &self,
        channel_id: &str,
        node_id: Option<&str>,
    ) -> Result<Vec<TreeNode>, StudioError> {
        let mut body = serde_json::json!({ "channel_id": channel_id });
        if let Some(node_id) = node_id {
            body["node_id"] = serde_json::Value::String(node_id.to_string());
        }
        let response: TreeDataResponse = self.post_json("get_node_tree_data", &body).await?;
        Ok(response.tree)
    }

    /// Fetch the status of many channels in one request.
    ///
    /// Returns `{channel_id_hex: status_string}`; channels the server does
    /// not know are simply absent from the map.
    pub async fn get_channel_status_bulk(
        &self,
        channel_ids: &[String],
    ) -> Result<HashMap<String, String>, StudioError> {
        let body = serde_json::json!({ "channel_ids": channel_ids });
        let response: BulkStatusResponse = self.post_json("get_channel_status_bulk", &body).await?;
        Ok(response.statuses)
    }

    /// Deploy a staged channel to the live channel.
    pub async fn activate_channel(&self, channel_id: &str) -> Result<(), StudioError> {
        let body = serde_json::json!({ "channel_id": channel_id });
        self.post_status("activate_channel_internal", &body).await
    }

    /// Publish a channel (makes it exportable to client devices).
    pub async fn publish_channel(&self, channel_id: &str) -> Result<(), StudioError> {
        let body = serde_json::json!({ "channel_id": channel_id });
        self.post_status("publish_channel", &body).await
    }

    /// Move the built tree to the staging or main tree.
    ///
    /// Returns the id of the new channel tree when the server reports one.
    pub async fn finish_channel(
        &self,
        channel_id: &str,
        stage: bool,
    ) -> Result<Option<String>, StudioError> {
        let body = serde_json::json!({ "channel_id": channel_id, "stage": stage });
        let response: FinishResponse = self.post_json("finish_channel", &body).await?;
        Ok(response.new_channel)
    }

    /// Whether the channel currently has a staged tree awaiting review.
    pub async fn check_channel_is_staged(&self, channel_id: &str) -> Result<bool, StudioError> {
        let body = serde_json::json!({ "channel_id": channel_id });
        let response: StagedResponse = self.post_json("check_channel_is_staged", &body).await?;
        Ok(response.staged)
    }

    /// Diff the staging (or main) tree against the previous tree.
    pub async fn compare_trees(
        &self,
        channel_id: &str,
        staging: bool,
    ) -> Result<TreeComparison, StudioError> {
        let body = serde_json::json!({ "channel_id": channel_id, "staging": staging });
        self.post_json("compare_trees", &body).await
    }

    // ---- private helpers ----

    /// POST an internal API endpoint and deserialize the JSON response.
    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, StudioError> {
        let response = self.send(endpoint, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StudioError::Decode(e.to_string()))
    }

    /// POST an internal API endpoint, discarding the response body.
    async fn post_status(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<(), StudioError> {
        self.send(endpoint, body).await?;
        Ok(())
    }

    async fn send(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, StudioError> {
        if self.token.is_empty() {
            return Err(StudioError::NoToken);
        }

        let url = format!("{}/api/internal/{endpoint}", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Token {}", self.token))
            .json(body)
            .send()
            .await
            .map_err(|e| StudioError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StudioError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_token_short_circuits_before_any_network_call() {
        // Point at a url that would fail DNS; NoToken must win.
        let client = StudioClient::new("https://studio.invalid", "");
        let err = client.get_node_tree_data("abc", None).await.unwrap_err();
        assert!(matches!(err, StudioError::NoToken));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        // Reserved TLD; resolution fails immediately rather than timing out.
        let client = StudioClient::new("http://studio.invalid", "token");
        let err = client
            .get_channel_status_bulk(&["abc".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Connection(_)));
    }

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let client = StudioClient::new("https://studio.example.com/", "t");
        assert_eq!(client.base_url(), "https://studio.example.com");
    }
}
