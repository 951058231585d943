//! SSE implementation of [`ChatTransport`].
//!
//! `POST {base}/chat` with the conversation history and target model id;
//! the response is a server-sent-event stream of token chunks:
//!
//! 1. `data: {"delta": "..."}` -- zero or more text fragments
//! 2. `data: {"done": true}` or `data: [DONE]` -- end of stream
//!
//! Connection setup happens lazily inside the returned stream, so the
//! slot controller can register its cancellation handle before the first
//! network round-trip. Cancellation is cooperative: dropping the stream
//! aborts the underlying request.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and exposed only
//! when building the Authorization header; it never appears in Debug
//! output or logs.

use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use chorus_core::transport::{BoxTokenStream, ChatRequest, ChatTransport};
use chorus_types::chat::ChatMessage;
use chorus_types::error::TransportError;
use chorus_types::stream::TokenEvent;

/// SSE streaming chat client. One independent connection per `stream_chat`.
pub struct SseChatTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl SseChatTransport {
    /// Create a transport for the given API base URL.
    pub fn new(api_key: SecretString, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            // Connect timeout only; stream duration is open-ended and the
            // server side owns overall timeout behavior.
            .connect_timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create reqwest client");
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

/// Wire shape of one message in the request body.
#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.to_string(),
            content: message.content.clone(),
        }
    }
}

/// Request body for the streaming chat endpoint.
#[derive(Debug, Serialize)]
struct ChatBody {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
}

/// One decoded SSE data payload.
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    delta: Option<String>,
    #[serde(default)]
    done: bool,
}

impl ChatTransport for SseChatTransport {
    fn stream_chat(&self, request: ChatRequest) -> BoxTokenStream {
        let client = self.client.clone();
        let url = format!("{}/chat", self.base_url);
        let api_key = self.api_key.clone();
        let body = ChatBody {
            model: request.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            stream: true,
        };

        Box::pin(async_stream::try_stream! {
            let response = client
                .post(&url)
                .bearer_auth(api_key.expose_secret())
                .json(&body)
                .send()
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                Err(TransportError::Status {
                    status: status.as_u16(),
                    body,
                })?;
                return;
            }

            yield TokenEvent::Connected;

            let mut events = response.bytes_stream().eventsource();
            while let Some(event) = events.next().await {
                let event = event.map_err(|e| TransportError::Stream(e.to_string()))?;
                if event.data == "[DONE]" {
                    yield TokenEvent::Done;
                    break;
                }
                let chunk: ChatChunk = serde_json::from_str(&event.data)
                    .map_err(|e| TransportError::Decode(e.to_string()))?;
                if let Some(text) = chunk.delta {
                    if !text.is_empty() {
                        yield TokenEvent::Delta { text };
                    }
                }
                if chunk.done {
                    yield TokenEvent::Done;
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_types::chat::MessageRole;

    #[test]
    fn chunk_decodes_delta_and_done() {
        let chunk: ChatChunk = serde_json::from_str(r#"{"delta": "Hel"}"#).unwrap();
        assert_eq!(chunk.delta.as_deref(), Some("Hel"));
        assert!(!chunk.done);

        let chunk: ChatChunk = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert!(chunk.delta.is_none());
        assert!(chunk.done);
    }

    #[tokio::test]
    async fn unreachable_endpoint_yields_connect_error() {
        let transport = SseChatTransport::new(
            SecretString::from("test-key".to_string()),
            "http://127.0.0.1:1",
        );
        let mut stream = transport.stream_chat(ChatRequest {
            model: "a:1".to_string(),
            messages: vec![ChatMessage::complete(MessageRole::User, "hi")],
        });

        match stream.next().await {
            Some(Err(TransportError::Connect(_))) => {}
            other => panic!("expected connect error, got {other:?}"),
        }
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn request_body_uses_lowercase_roles() {
        let body = ChatBody {
            model: "a:1".to_string(),
            messages: vec![WireMessage::from(&ChatMessage::complete(
                MessageRole::User,
                "hi",
            ))],
            stream: true,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""role":"user""#));
        assert!(json.contains(r#""stream":true"#));
    }
}
