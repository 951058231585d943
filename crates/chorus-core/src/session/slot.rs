//! Per-slot stream controller.
//!
//! Each slot drives its own state machine
//! (`Idle -> Streaming -> Completed/Cancelled/Errored -> Streaming ...`)
//! and consumes its model's token stream in a dedicated task. Slots are
//! mutually independent: a failure or `stop` on one slot never touches a
//! sibling.
//!
//! Cancellation is advisory. `stop` transitions the slot immediately and
//! signals the transport's abort token; a token that arrives late from
//! the draining connection carries a stale generation number and is
//! discarded without moving the state backward.

use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use chorus_types::chat::{ChatMessage, MessageRole, SlotSnapshot, SlotState};
use chorus_types::error::{SessionError, TransportError};
use chorus_types::model::ModelDescriptor;
use chorus_types::notice::SessionNotice;
use chorus_types::stream::TokenEvent;

use crate::notice::NoticeBus;
use crate::transport::{BoxTokenStream, ChatRequest, ChatTransport};

/// Controller for one fixed-index slot in the session pool.
///
/// Interior state is guarded by a mutex; writers are the slot's own
/// stream task, `append`/`stop` from the handle, and `try_assign`/`clear`
/// from the pool manager. No lock is held across an await.
pub struct SlotController {
    index: usize,
    bus: NoticeBus,
    inner: Mutex<SlotInner>,
}

struct SlotInner {
    model: Option<ModelDescriptor>,
    messages: Vec<ChatMessage>,
    state: SlotState,
    /// Abort signal for the in-flight request, if any.
    cancel: Option<CancellationToken>,
    /// Incremented on every stream start; late events from a superseded
    /// stream fail the generation check and are dropped.
    generation: u64,
}

impl SlotController {
    pub(crate) fn new(index: usize, bus: NoticeBus) -> Self {
        Self {
            index,
            bus,
            inner: Mutex::new(SlotInner {
                model: None,
                messages: Vec::new(),
                state: SlotState::Idle,
                cancel: None,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        self.inner.lock().expect("slot lock poisoned")
    }

    /// Fixed index of this slot in the pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Read-only snapshot of model, transcript, and state.
    pub fn snapshot(&self) -> SlotSnapshot {
        let inner = self.lock();
        SlotSnapshot {
            index: self.index,
            model: inner.model.clone(),
            messages: inner.messages.clone(),
            state: inner.state,
        }
    }

    pub fn state(&self) -> SlotState {
        self.lock().state
    }

    pub fn is_streaming(&self) -> bool {
        self.lock().state == SlotState::Streaming
    }

    /// Identifier of the currently assigned model, if any.
    pub fn model_id(&self) -> Option<String> {
        self.lock().model.as_ref().map(|m| m.id.clone())
    }

    /// Assign a model to this slot unless it is mid-stream for another.
    ///
    /// Re-assigning the same model is a no-op that preserves the
    /// transcript and state (resolve idempotence). Assigning a different
    /// model to a non-streaming slot clears the transcript. Returns false
    /// when the slot is mid-stream for a different model and must be kept
    /// as a stale handle.
    pub(crate) fn try_assign(&self, model: &ModelDescriptor) -> bool {
        let mut inner = self.lock();
        match &inner.model {
            Some(current) if current.id == model.id => true,
            _ if inner.state == SlotState::Streaming => false,
            _ => {
                debug!(slot = self.index, model = %model.id, "slot assigned");
                inner.model = Some(model.clone());
                inner.messages.clear();
                inner.state = SlotState::Idle;
                inner.cancel = None;
                true
            }
        }
    }

    /// Empty the slot. Only legal when not streaming; the pool manager
    /// checks before calling.
    pub(crate) fn clear(&self) {
        let mut inner = self.lock();
        debug_assert_ne!(inner.state, SlotState::Streaming);
        inner.model = None;
        inner.messages.clear();
        inner.state = SlotState::Idle;
        inner.cancel = None;
    }

    /// Start a new exchange: record the user message and stream the
    /// model's reply into the transcript.
    ///
    /// Legal from any non-streaming state (`Idle`, `Completed`,
    /// `Cancelled`, `Errored` are all re-entrant start points; a failed
    /// stream is retried only by a caller-initiated append).
    pub fn append(
        self: &Arc<Self>,
        transport: &Arc<dyn ChatTransport>,
        content: &str,
    ) -> Result<(), SessionError> {
        let (request, cancel, generation) = {
            let mut inner = self.lock();
            let Some(model) = inner.model.clone() else {
                return Err(SessionError::NoModel { index: self.index });
            };
            if !inner.state.can_start() {
                return Err(SessionError::SlotBusy { index: self.index });
            }

            inner
                .messages
                .push(ChatMessage::complete(MessageRole::User, content));
            let history = inner.messages.clone();
            inner.messages.push(ChatMessage::streaming_placeholder());
            inner.state = SlotState::Streaming;
            inner.generation += 1;

            let cancel = CancellationToken::new();
            inner.cancel = Some(cancel.clone());

            (
                ChatRequest {
                    model: model.id,
                    messages: history,
                },
                cancel,
                inner.generation,
            )
        };

        let stream = transport.stream_chat(request);
        let slot = Arc::clone(self);
        tokio::spawn(async move {
            slot.run_stream(stream, cancel, generation).await;
        });
        Ok(())
    }

    /// Cancel the in-flight request, keeping the partial transcript.
    ///
    /// Idempotent: a no-op when the slot is not streaming. The state
    /// moves to `Cancelled` immediately; the underlying transport may
    /// take a moment to actually stop, and any token it still delivers
    /// is discarded by the generation check.
    pub fn stop(&self) {
        let mut inner = self.lock();
        if inner.state != SlotState::Streaming {
            return;
        }
        if let Some(cancel) = inner.cancel.take() {
            cancel.cancel();
        }
        inner.state = SlotState::Cancelled;
        seal_open_message(&mut inner.messages);
        debug!(slot = self.index, "stream cancelled");
    }

    /// Consume one token stream until it ends, errors, or is cancelled.
    async fn run_stream(
        self: Arc<Self>,
        mut stream: BoxTokenStream,
        cancel: CancellationToken,
        generation: u64,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    // `stop` already transitioned the slot; just stop
                    // draining the connection.
                    return;
                }
                event = stream.next() => match event {
                    Some(Ok(TokenEvent::Connected)) => {}
                    Some(Ok(TokenEvent::Delta { text })) => self.push_token(generation, &text),
                    Some(Ok(TokenEvent::Done)) | None => {
                        self.finish(generation);
                        return;
                    }
                    Some(Err(err)) => {
                        self.fail(generation, err);
                        return;
                    }
                },
            }
        }
    }

    /// Append one token to the in-progress message, in arrival order.
    ///
    /// Dropped silently when the stream has been superseded or the slot
    /// already left `Streaming` (late token after `stop`).
    fn push_token(&self, generation: u64, text: &str) {
        let mut inner = self.lock();
        if inner.generation != generation || inner.state != SlotState::Streaming {
            return;
        }
        if let Some(message) = inner.messages.last_mut() {
            message.content.push_str(text);
        }
    }

    /// Transition to `Completed` when the stream ends naturally.
    fn finish(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation || inner.state != SlotState::Streaming {
            return;
        }
        inner.state = SlotState::Completed;
        inner.cancel = None;
        seal_open_message(&mut inner.messages);
        debug!(slot = self.index, "stream completed");
    }

    /// Transition to `Errored`, keep the partial content, and publish an
    /// attributed notice. Never propagates past the slot boundary.
    fn fail(&self, generation: u64, err: TransportError) {
        let model_name = {
            let mut inner = self.lock();
            if inner.generation != generation || inner.state != SlotState::Streaming {
                return;
            }
            inner.state = SlotState::Errored;
            inner.cancel = None;
            seal_open_message(&mut inner.messages);
            inner
                .model
                .as_ref()
                .map(|m| m.display_name.clone())
                .unwrap_or_default()
        };

        warn!(slot = self.index, model = %model_name, error = %err, "stream failed");
        self.bus.publish(SessionNotice::SlotFailed {
            index: self.index,
            model_name,
            message: err.to_string(),
        });
    }
}

/// Mark the trailing in-progress message complete; its partial content
/// is preserved, never rolled back.
fn seal_open_message(messages: &mut [ChatMessage]) {
    if let Some(message) = messages.last_mut() {
        message.complete = true;
    }
}
