//! HttpQuotaSource -- concrete [`QuotaSource`] over the quota endpoint.
//!
//! `GET {base}/quota?user=<id>` returns `{"remaining": N|null,
//! "remaining_pro": N|null}` with `null` meaning unlimited. Queried once
//! per turn attempt by the quota gate; never cached here.

use chorus_core::quota::QuotaSource;
use chorus_types::error::QuotaError;
use chorus_types::quota::QuotaStatus;

/// HTTP implementation of the quota endpoint.
pub struct HttpQuotaSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQuotaSource {
    /// Create a quota client for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: super::build_client(),
            base_url: base_url.into(),
        }
    }
}

impl QuotaSource for HttpQuotaSource {
    async fn fetch_quota(&self, user: &str) -> Result<QuotaStatus, QuotaError> {
        let url = format!("{}/quota", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("user", user)])
            .send()
            .await
            .map_err(|e| QuotaError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuotaError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<QuotaStatus>()
            .await
            .map_err(|e| QuotaError::Decode(e.to_string()))
    }
}
