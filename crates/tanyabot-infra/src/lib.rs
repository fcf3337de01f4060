//! Infrastructure layer for TanyaBot.
//!
//! Contains implementations of the traits defined in `tanyabot-core`:
//! SQLite persistence for sessions, turns, and popular prompts; OpenAI chat
//! and embeddings clients; and the PostgREST vector-search client used for
//! reference-passage retrieval.

pub mod config;
pub mod llm;
pub mod search;
pub mod sqlite;
