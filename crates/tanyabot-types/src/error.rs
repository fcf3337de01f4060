use thiserror::Error;

/// Errors from repository operations (used by trait definitions in tanyabot-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from generative-model and embedding calls.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited")]
    RateLimited,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("missing API key")]
    MissingApiKey,
}

/// Errors from the external vector search service.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Http(String),

    #[error("search returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode search response: {0}")]
    Decode(String),
}

/// Precondition violations when calling the conversation orchestrator directly.
///
/// Everything else that can go wrong inside a conversation is absorbed into
/// the user-safe fallback reply and never surfaces as an error.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("session id must not be empty")]
    MissingSessionId,
}
