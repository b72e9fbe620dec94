//! Unit tests for `ControlHub`.
//!
//! These tests exercise the channel-scoped control topic hub directly,
//! without performing any HTTP upgrades. They verify subscribe/evict
//! semantics, per-channel broadcast isolation, and graceful shutdown
//! behaviour.

use assert_matches::assert_matches;
use axum::extract::ws::Message;
use chefboard_api::ws::ControlHub;

// ---------------------------------------------------------------------------
// Test: new hub starts with zero listeners
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_hub_has_zero_listeners() {
    let hub = ControlHub::new();

    assert_eq!(hub.connection_count().await, 0);
    assert_eq!(hub.listener_count("aaa").await, 0);
}

// ---------------------------------------------------------------------------
// Test: subscribe registers a listener on its channel topic
// ---------------------------------------------------------------------------

#[tokio::test]
async fn subscribe_registers_listener_on_topic() {
    let hub = ControlHub::new();

    let _rx = hub.subscribe("aaa", "conn-1".to_string()).await;

    assert_eq!(hub.listener_count("aaa").await, 1);
    assert_eq!(hub.listener_count("bbb").await, 0);
}

// ---------------------------------------------------------------------------
// Test: a new subscriber evicts previous listeners on the same channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_subscriber_evicts_previous_listener() {
    let hub = ControlHub::new();

    let mut old_rx = hub.subscribe("aaa", "conn-1".to_string()).await;
    let _new_rx = hub.subscribe("aaa", "conn-2".to_string()).await;

    // Only the newest daemon stays on the topic.
    assert_eq!(hub.listener_count("aaa").await, 1);

    // The evicted listener received a Close frame.
    let msg = old_rx.recv().await.expect("evicted listener gets Close");
    assert_matches!(msg, Message::Close(None));
}

// ---------------------------------------------------------------------------
// Test: broadcast reaches only the target channel's listeners
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_is_scoped_to_one_channel() {
    let hub = ControlHub::new();

    let mut rx_a = hub.subscribe("aaa", "conn-a".to_string()).await;
    let mut rx_b = hub.subscribe("bbb", "conn-b".to_string()).await;

    let sent = hub
        .broadcast("aaa", Message::Text("{\"command\":\"stop\"}".into()))
        .await;
    assert_eq!(sent, 1);

    let msg = rx_a.recv().await.expect("listener on aaa receives");
    assert!(matches!(msg, Message::Text(t) if t.as_str().contains("stop")));

    // Nothing was delivered to the other channel's listener.
    assert!(rx_b.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// Test: broadcast to a channel with no listeners delivers to zero
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_without_listeners_delivers_to_zero() {
    let hub = ControlHub::new();

    let sent = hub.broadcast("ghost", Message::Text("{}".into())).await;
    assert_eq!(sent, 0);
}

// ---------------------------------------------------------------------------
// Test: unsubscribe removes the listener and drops empty topics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsubscribe_removes_listener() {
    let hub = ControlHub::new();

    let _rx = hub.subscribe("aaa", "conn-1".to_string()).await;
    assert_eq!(hub.listener_count("aaa").await, 1);

    hub.unsubscribe("aaa", "conn-1").await;
    assert_eq!(hub.listener_count("aaa").await, 0);
    assert_eq!(hub.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: unsubscribe with unknown ids is a no-op
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsubscribe_unknown_is_noop() {
    let hub = ControlHub::new();

    let _rx = hub.subscribe("aaa", "conn-1".to_string()).await;
    hub.unsubscribe("aaa", "nonexistent").await;
    hub.unsubscribe("zzz", "conn-1").await;

    assert_eq!(hub.listener_count("aaa").await, 1);
}

// ---------------------------------------------------------------------------
// Test: shutdown_all sends Close and clears every topic
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let hub = ControlHub::new();

    let mut rx1 = hub.subscribe("aaa", "conn-1".to_string()).await;
    let mut rx2 = hub.subscribe("bbb", "conn-2".to_string()).await;
    assert_eq!(hub.connection_count().await, 2);

    hub.shutdown_all().await;

    assert_eq!(hub.connection_count().await, 0);

    let msg1 = rx1.recv().await.expect("rx1 should receive Close");
    assert_matches!(msg1, Message::Close(None));

    let msg2 = rx2.recv().await.expect("rx2 should receive Close");
    assert_matches!(msg2, Message::Close(None));

    // After Close, the channels are closed (no more messages).
    assert!(rx1.recv().await.is_none());
}
