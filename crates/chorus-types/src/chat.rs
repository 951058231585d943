//! Chat message and slot lifecycle types.
//!
//! A slot is a fixed-index position in the session pool holding one
//! model's transcript. `SlotState` is the per-slot state machine driven
//! by the stream controller in `chorus-core`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ModelDescriptor;

/// Role of a message in a slot transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// One message event in a slot's ordered transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    /// False while tokens are still being appended to this message.
    pub complete: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a completed message (user/system turns arrive whole).
    pub fn complete(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role,
            content: content.into(),
            complete: true,
            created_at: Utc::now(),
        }
    }

    /// Create an empty in-progress assistant message to stream into.
    pub fn streaming_placeholder() -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::Assistant,
            content: String::new(),
            complete: false,
            created_at: Utc::now(),
        }
    }
}

/// Lifecycle state of a session slot.
///
/// `Idle`, `Completed`, `Cancelled`, and `Errored` are all legal start
/// points for a new append; only `Streaming` refuses one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Idle,
    Streaming,
    Completed,
    Cancelled,
    Errored,
}

impl SlotState {
    /// Whether a new append may start from this state.
    pub fn can_start(self) -> bool {
        !matches!(self, SlotState::Streaming)
    }

    /// Whether this state ends a stream (no further token events accepted).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SlotState::Completed | SlotState::Cancelled | SlotState::Errored
        )
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotState::Idle => write!(f, "idle"),
            SlotState::Streaming => write!(f, "streaming"),
            SlotState::Completed => write!(f, "completed"),
            SlotState::Cancelled => write!(f, "cancelled"),
            SlotState::Errored => write!(f, "errored"),
        }
    }
}

impl FromStr for SlotState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(SlotState::Idle),
            "streaming" => Ok(SlotState::Streaming),
            "completed" => Ok(SlotState::Completed),
            "cancelled" => Ok(SlotState::Cancelled),
            "errored" => Ok(SlotState::Errored),
            other => Err(format!("invalid slot state: '{other}'")),
        }
    }
}

/// Read-only snapshot of one slot: assigned model, transcript, state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub index: usize,
    pub model: Option<ModelDescriptor>,
    pub messages: Vec<ChatMessage>,
    pub state: SlotState,
}
