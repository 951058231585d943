//! HTTP clients for the model metadata and quota endpoints.

pub mod catalog;
pub mod quota;

pub use catalog::HttpModelCatalog;
pub use quota::HttpQuotaSource;

use std::time::Duration;

/// Shared reqwest client construction for the request/response endpoints.
pub(crate) fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to create reqwest client")
}
