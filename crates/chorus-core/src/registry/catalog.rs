//! ModelCatalog trait definition.
//!
//! The model metadata endpoint behind a trait so the cache can be tested
//! with a fake catalog and a paused clock. The sole production caller is
//! [`super::ModelRegistryCache`]; the HTTP implementation lives in
//! `chorus-infra`.

use chorus_types::error::RegistryError;
use chorus_types::model::ModelDescriptor;

/// Trait for the model metadata endpoint.
pub trait ModelCatalog: Send + Sync {
    /// Fetch the current list of models and their capability flags.
    fn fetch_models(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ModelDescriptor>, RegistryError>> + Send;
}
