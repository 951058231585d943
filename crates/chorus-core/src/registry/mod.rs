//! Model registry: catalog trait and time-bounded cache.

pub mod cache;
pub mod catalog;

pub use cache::ModelRegistryCache;
pub use catalog::ModelCatalog;
