//! Observability for TanyaBot: tracing subscriber setup.

pub mod tracing_setup;
