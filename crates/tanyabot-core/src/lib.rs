//! Business logic and repository trait definitions for TanyaBot.
//!
//! This crate defines the "ports" (repository and provider traits) that the
//! infrastructure layer implements, plus the conversation pipeline itself:
//! standalone-question rewriting, retrieval, grounded answer generation,
//! durable persistence, and best-effort popularity tracking. It depends only
//! on `tanyabot-types` -- never on `tanyabot-infra` or any database/HTTP crate.

pub mod chat;
pub mod classify;
pub mod history;
pub mod llm;
pub mod popularity;
pub mod prompts;
pub mod retrieval;
pub mod transcript;
