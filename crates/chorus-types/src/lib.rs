//! Shared domain types for Chorus.
//!
//! Pure data shapes with serde derives and thiserror error enums.
//! No async, no I/O -- everything here is consumed by `chorus-core`
//! and `chorus-infra`.

pub mod chat;
pub mod config;
pub mod error;
pub mod model;
pub mod notice;
pub mod quota;
pub mod stream;

/// Fixed ceiling on concurrently mounted model sessions.
///
/// The session pool always allocates exactly this many slots up front;
/// requests for more models are truncated at the boundary, never queued.
pub const POOL_CAPACITY: usize = 10;
