//! HttpModelCatalog -- concrete [`ModelCatalog`] over the model metadata
//! endpoint.
//!
//! `GET {base}/models` returns a JSON array of model records. The
//! registry cache in `chorus-core` is the sole caller; it owns all
//! failure recovery (stale serving), so this client just reports errors
//! faithfully.

use chorus_core::registry::ModelCatalog;
use chorus_types::error::RegistryError;
use chorus_types::model::ModelDescriptor;

/// HTTP implementation of the model metadata endpoint.
pub struct HttpModelCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpModelCatalog {
    /// Create a catalog client for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: super::build_client(),
            base_url: base_url.into(),
        }
    }
}

impl ModelCatalog for HttpModelCatalog {
    async fn fetch_models(&self) -> Result<Vec<ModelDescriptor>, RegistryError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RegistryError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Vec<ModelDescriptor>>()
            .await
            .map_err(|e| RegistryError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_record_wire_format() {
        let json = r#"[{
            "id": "anthropic:claude-sonnet-4",
            "display_name": "Claude Sonnet 4",
            "provider": "anthropic",
            "capabilities": {"vision": true, "tool_calling": true, "reasoning": false},
            "accessible": true,
            "context_window": 200000
        }]"#;
        let models: Vec<ModelDescriptor> = serde_json::from_str(json).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, "anthropic:claude-sonnet-4");
        assert!(models[0].capabilities.vision);
    }
}
