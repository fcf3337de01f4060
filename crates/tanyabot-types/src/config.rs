//! Global configuration types for TanyaBot.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls
//! model names, retrieval settings, and the vector search endpoint.
//! API keys are never stored here; they come from the environment.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the TanyaBot backend.
///
/// Loaded from `~/.tanyabot/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Chat model used for question rewriting and answer generation.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Embedding model for retrieval and popularity tracking.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Number of passages the retriever requests from the vector search.
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,

    /// External vector search service settings.
    #[serde(default)]
    pub vector_search: VectorSearchConfig,

    /// SQLite pool tuning.
    #[serde(default)]
    pub database: DatabaseConfig,
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_retrieval_top_k() -> usize {
    4
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            retrieval_top_k: default_retrieval_top_k(),
            vector_search: VectorSearchConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

/// SQLite pool tuning.
///
/// Reads fan out across `reader_connections`; writes are always serialized
/// on a single connection, so there is no knob for the writer side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connections in the read-only pool.
    #[serde(default = "default_reader_connections")]
    pub reader_connections: u32,

    /// SQLite busy timeout in milliseconds, applied to every connection.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_reader_connections() -> u32 {
    8
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            reader_connections: default_reader_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Where the reference-passage similarity search lives.
///
/// The service exposes a PostgREST RPC function (e.g. Supabase's
/// `match_documents`) that takes a query embedding and returns ranked
/// passages. The API key comes from `VECTOR_SEARCH_KEY` in the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchConfig {
    /// Base URL of the PostgREST-compatible service.
    #[serde(default)]
    pub base_url: String,

    /// Name of the RPC function performing the similarity search.
    #[serde(default = "default_match_function")]
    pub match_function: String,
}

fn default_match_function() -> String {
    "match_documents".to_string()
}

impl Default for VectorSearchConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            match_function: default_match_function(),
        }
    }
}
