//! Error enums shared across the workspace.

use thiserror::Error;

/// Errors from the model metadata endpoint.
///
/// These never reach the end user: the registry cache recovers by serving
/// its last good list and logging the failure.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model list: {0}")]
    Decode(String),
}

/// Errors from the quota endpoint.
#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {status}")]
    Status { status: u16 },

    #[error("malformed quota response: {0}")]
    Decode(String),
}

/// Errors from a streaming chat connection.
///
/// Always isolated to the slot that owns the connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("malformed stream payload: {0}")]
    Decode(String),
}

/// Errors from session pool and slot operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("slot {index} is mid-stream and cannot accept an append")]
    SlotBusy { index: usize },

    #[error("slot {index} has no model assigned")]
    NoModel { index: usize },
}
