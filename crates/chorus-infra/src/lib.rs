//! Infrastructure implementations for Chorus.
//!
//! HTTP clients for the three external endpoints the core consumes
//! ([`http::HttpModelCatalog`], [`http::HttpQuotaSource`],
//! [`sse::SseChatTransport`]) and the `config.toml` loader.

pub mod config;
pub mod http;
pub mod sse;
