//! Core logic for Chorus: the bounded concurrent multi-model chat
//! session manager and its two correctness collaborators.
//!
//! - [`registry`] -- TTL'd model list cache with single-flight refresh
//!   and stale-while-revalidate reads.
//! - [`quota`] -- pre-flight per-turn allowance check with threshold
//!   warnings.
//! - [`session`] -- the fixed-capacity slot pool and per-slot stream
//!   controllers.
//! - [`service`] -- the turn orchestrator tying the three together.
//!
//! Network access happens only behind the [`transport::ChatTransport`],
//! [`registry::ModelCatalog`], and [`quota::QuotaSource`] traits;
//! implementations live in `chorus-infra`.

pub mod notice;
pub mod quota;
pub mod registry;
pub mod service;
pub mod session;
pub mod transport;
