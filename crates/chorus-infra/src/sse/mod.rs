//! SSE streaming chat transport.

pub mod transport;

pub use transport::SseChatTransport;
