//! PromptRepository trait definition.
//!
//! Persistence and similarity search for popular prompts. Implementations
//! live in tanyabot-infra (e.g., `SqlitePromptRepository`). Uses native
//! async fn in traits (RPITIT, Rust 2024 edition).

use chrono::{DateTime, Utc};
use tanyabot_types::error::RepositoryError;
use tanyabot_types::prompt::{PopularPrompt, SimilarPrompt};
use uuid::Uuid;

/// Repository trait for popular-prompt records.
pub trait PromptRepository: Send + Sync {
    /// Prompts whose stored embedding has cosine similarity >= `threshold`
    /// to the query embedding, best match first, up to `limit`.
    fn find_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<SimilarPrompt>, RepositoryError>> + Send;

    /// Look up the canonical record for an exact question text.
    fn find_exact(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<Option<PopularPrompt>, RepositoryError>> + Send;

    /// Atomically increment a record's counter and bump its last-used
    /// timestamp. The counter is monotonically non-decreasing.
    fn increment(
        &self,
        id: &Uuid,
        last_used_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert a new record (count = 1) with its embedding.
    fn insert(
        &self,
        prompt: &PopularPrompt,
        embedding: &[f32],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Most-asked prompts, counter descending (dashboard readback).
    fn top_prompts(
        &self,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<PopularPrompt>, RepositoryError>> + Send;
}
