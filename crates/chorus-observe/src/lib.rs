//! Observability setup for Chorus.

pub mod tracing_setup;
