//! Channel-scoped control message hub.
//!
//! Each content channel is a publish/subscribe topic: daemonized chef
//! processes subscribe to their channel's topic over WebSocket, and the
//! admin control endpoint broadcasts command messages to every listener
//! on that topic. This is deliberately not a general chat-room
//! primitive -- topics are keyed by channel id and carry only control
//! traffic.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to one listener connection.
pub type ListenerSender = mpsc::UnboundedSender<Message>;

/// Manages all connected control listeners, grouped by channel id.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc`
/// and shared across the application.
pub struct ControlHub {
    topics: RwLock<HashMap<String, HashMap<String, ListenerSender>>>,
}

impl ControlHub {
    /// Create a new, empty hub.
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Register a listener on a channel's topic.
    ///
    /// Previously connected listeners for the same channel are evicted
    /// first (sent a Close frame and dropped): only the most recent chef
    /// daemon should receive control commands.
    ///
    /// Returns the receiver half of the listener's message channel so
    /// the caller can forward messages to the WebSocket sink.
    pub async fn subscribe(
        &self,
        channel_id: &str,
        conn_id: String,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut topics = self.topics.write().await;
        let listeners = topics.entry(channel_id.to_string()).or_default();

        let evicted = listeners.len();
        for stale in listeners.values() {
            let _ = stale.send(Message::Close(None));
        }
        listeners.clear();
        if evicted > 0 {
            tracing::info!(channel_id, evicted, "Evicted stale control listeners");
        }

        listeners.insert(conn_id, tx);
        rx
    }

    /// Remove a listener from a channel's topic.
    ///
    /// Empty topics are dropped so the map does not accumulate ids of
    /// channels whose daemons have all disconnected.
    pub async fn unsubscribe(&self, channel_id: &str, conn_id: &str) {
        let mut topics = self.topics.write().await;
        if let Some(listeners) = topics.get_mut(channel_id) {
            listeners.remove(conn_id);
            if listeners.is_empty() {
                topics.remove(channel_id);
            }
        }
    }

    /// Broadcast a message to every listener on a channel's topic.
    ///
    /// Listeners whose send channels are closed are silently skipped
    /// (they are cleaned up when their receive loop exits). Returns the
    /// number of listeners the message was sent to.
    pub async fn broadcast(&self, channel_id: &str, message: Message) -> usize {
        let topics = self.topics.read().await;
        let Some(listeners) = topics.get(channel_id) else {
            return 0;
        };
        let mut count = 0;
        for listener in listeners.values() {
            if listener.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Number of listeners currently subscribed to a channel's topic.
    pub async fn listener_count(&self, channel_id: &str) -> usize {
        self.topics
            .read()
            .await
            .get(channel_id)
            .map(|l| l.len())
            .unwrap_or(0)
    }

    /// Total number of connected listeners across all topics.
    pub async fn connection_count(&self) -> usize {
        self.topics.read().await.values().map(|l| l.len()).sum()
    }

    /// Send a Ping frame to every connected listener.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let topics = self.topics.read().await;
        for listeners in topics.values() {
            for listener in listeners.values() {
                let _ = listener.send(Message::Ping(Bytes::new()));
            }
        }
    }

    /// Send a Close frame to every listener, then clear all topics.
    ///
    /// Used during graceful shutdown to notify daemons before the server
    /// stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut topics = self.topics.write().await;
        let count: usize = topics.values().map(|l| l.len()).sum();
        for listeners in topics.values() {
            for listener in listeners.values() {
                let _ = listener.send(Message::Close(None));
            }
        }
        topics.clear();
        tracing::info!(count, "Closed all control listener connections");
    }
}

impl Default for ControlHub {
    fn default() -> Self {
        Self::new()
    }
}
