//! Model metadata types.
//!
//! A `ModelDescriptor` is the unit the registry cache fetches and serves.
//! Descriptors are immutable once fetched and superseded wholesale on a
//! cache refresh -- there is no per-field patching.

use serde::{Deserialize, Serialize};

/// Capability flags for a single model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// Accepts image input.
    #[serde(default)]
    pub vision: bool,
    /// Supports tool/function calling.
    #[serde(default)]
    pub tool_calling: bool,
    /// Emits extended reasoning/thinking content.
    #[serde(default)]
    pub reasoning: bool,
}

/// Metadata for one selectable model, as served by the model metadata
/// endpoint.
///
/// `id` is globally unique in the form `"<provider>:<model-name>"`
/// (e.g., `"anthropic:claude-sonnet-4"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Globally unique identifier, `"<provider>:<model-name>"`.
    pub id: String,
    /// Human-readable name shown in the UI and in per-slot error notices.
    pub display_name: String,
    /// Provider identifier (e.g., "anthropic", "openai").
    pub provider: String,
    /// What this model supports.
    #[serde(default)]
    pub capabilities: ModelCapabilities,
    /// Whether the current user may select this model (free/open/entitled).
    #[serde(default)]
    pub accessible: bool,
    /// Context window size in tokens.
    pub context_window: u32,
}

impl ModelDescriptor {
    /// Whether this model may be mounted for a turn with the given needs.
    ///
    /// A model is eligible when it is accessible to the user and, if the
    /// turn carries image input, supports vision.
    pub fn eligible(&self, needs_vision: bool) -> bool {
        self.accessible && (!needs_vision || self.capabilities.vision)
    }
}
