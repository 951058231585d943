//! Test doubles for driving slot controllers without a network.
//!
//! `ScriptedTransport` hands out pre-built token streams in FIFO order,
//! one per `stream_chat` call. `channel_stream` gives the test manual
//! control over a stream's timing (mid-stream tokens, errors, hangs).

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::mpsc;

use chorus_types::error::TransportError;
use chorus_types::stream::TokenEvent;

use crate::transport::{BoxTokenStream, ChatRequest, ChatTransport};

/// Transport whose streams are scripted ahead of time.
///
/// A `stream_chat` call with no scripted stream left gets an immediately
/// ending one (the slot completes with empty content).
pub(crate) struct ScriptedTransport {
    streams: Mutex<VecDeque<BoxTokenStream>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            streams: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, stream: BoxTokenStream) {
        self.streams.lock().unwrap().push_back(stream);
    }
}

impl ChatTransport for ScriptedTransport {
    fn stream_chat(&self, _request: ChatRequest) -> BoxTokenStream {
        self.streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Box::pin(futures_util::stream::empty()))
    }
}

/// A stream that yields all its tokens immediately, then completes.
pub(crate) fn instant_stream(tokens: &[&str]) -> BoxTokenStream {
    let events: Vec<Result<TokenEvent, TransportError>> =
        std::iter::once(Ok(TokenEvent::Connected))
            .chain(tokens.iter().map(|t| {
                Ok(TokenEvent::Delta {
                    text: (*t).to_string(),
                })
            }))
            .chain(std::iter::once(Ok(TokenEvent::Done)))
            .collect();
    Box::pin(futures_util::stream::iter(events))
}

/// A stream that yields some tokens, then fails with a transport error.
pub(crate) fn failing_stream(tokens: &[&str], error: &str) -> BoxTokenStream {
    let events: Vec<Result<TokenEvent, TransportError>> =
        std::iter::once(Ok(TokenEvent::Connected))
            .chain(tokens.iter().map(|t| {
                Ok(TokenEvent::Delta {
                    text: (*t).to_string(),
                })
            }))
            .chain(std::iter::once(Err(TransportError::Stream(error.to_string()))))
            .collect();
    Box::pin(futures_util::stream::iter(events))
}

/// A manually driven stream: the test emits events through the sender.
///
/// Dropping the sender ends the stream (the slot completes).
pub(crate) fn channel_stream() -> (
    mpsc::UnboundedSender<Result<TokenEvent, TransportError>>,
    BoxTokenStream,
) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let stream = Box::pin(async_stream::stream! {
        while let Some(item) = rx.recv().await {
            yield item;
        }
    });
    (tx, stream)
}
