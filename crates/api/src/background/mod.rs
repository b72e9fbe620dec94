//! Background work dispatched from request handlers.
//!
//! Each submodule provides a function intended to run on a detached
//! `tokio::spawn` task, fire-and-forget: the triggering request returns
//! immediately and never waits on the result.

pub mod tree_cache;
