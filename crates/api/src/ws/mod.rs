//! WebSocket control channel for daemonized chef processes.
//!
//! Provides the channel-scoped listener hub, the HTTP upgrade handler
//! used by Axum routes, and the heartbeat task.

mod handler;
mod heartbeat;
pub mod hub;

pub use handler::control_ws_handler;
pub use heartbeat::start_heartbeat;
pub use hub::ControlHub;
