//! Provider-agnostic token stream events.
//!
//! Each provider's concrete wire format is decoded in `chorus-infra`;
//! the core only ever sees this reduced event surface.

use serde::{Deserialize, Serialize};

/// Events emitted by a streaming chat connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenEvent {
    /// Connection established with the provider.
    Connected,

    /// A fragment of assistant text, appended in arrival order.
    Delta { text: String },

    /// The stream has completed normally.
    Done,
}
