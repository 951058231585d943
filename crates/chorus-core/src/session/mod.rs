//! Fixed-capacity session pool and per-slot stream controllers.

pub mod pool;
pub mod slot;

#[cfg(test)]
pub(crate) mod testing;

pub use pool::{SessionHandle, SessionPool};
