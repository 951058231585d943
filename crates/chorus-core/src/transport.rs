//! ChatTransport trait definition.
//!
//! The streaming chat endpoint is an opaque async token source to the
//! core: one independent connection per active slot, cancelled
//! cooperatively by dropping the stream. Concrete implementations
//! (SSE over reqwest) live in `chorus-infra`.

use std::pin::Pin;

use futures_util::Stream;

use chorus_types::chat::ChatMessage;
use chorus_types::error::TransportError;
use chorus_types::stream::TokenEvent;

/// A boxed stream of token events from one chat connection.
pub type BoxTokenStream =
    Pin<Box<dyn Stream<Item = Result<TokenEvent, TransportError>> + Send + 'static>>;

/// One streaming chat request: a conversation history plus a target model.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Target model identifier (`"<provider>:<model-name>"`).
    pub model: String,
    /// Ordered conversation history, ending with the new user message.
    pub messages: Vec<ChatMessage>,
}

/// Trait for the per-model streaming chat endpoint.
///
/// Returns a boxed stream so the trait stays object-safe -- slot
/// controllers hold an `Arc<dyn ChatTransport>` and open one stream per
/// append. Connection setup happens lazily inside the stream; the first
/// poll performs the request.
pub trait ChatTransport: Send + Sync {
    /// Open a streaming chat connection for the given request.
    fn stream_chat(&self, request: ChatRequest) -> BoxTokenStream;
}
