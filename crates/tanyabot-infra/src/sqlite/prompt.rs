//! SQLite popular-prompt repository implementation.
//!
//! Implements `PromptRepository` from `tanyabot-core`. Embeddings are stored
//! as JSON-encoded float arrays and similarity is ranked by an in-process
//! cosine scan over the table -- the prompt corpus is small and the external
//! vector index is reserved for the reference-passage corpus. Counter
//! increments are atomic (`count = count + 1`) so concurrent trackers never
//! lose an increment to a read-modify-write race.

use tanyabot_core::popularity::repository::PromptRepository;
use tanyabot_types::error::RepositoryError;
use tanyabot_types::prompt::{PopularPrompt, SimilarPrompt};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `PromptRepository`.
pub struct SqlitePromptRepository {
    pool: DatabasePool,
}

impl SqlitePromptRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct PromptRow {
    id: String,
    prompt: String,
    count: i64,
    last_used_at: String,
}

impl PromptRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            prompt: row.try_get("prompt")?,
            count: row.try_get("count")?,
            last_used_at: row.try_get("last_used_at")?,
        })
    }

    fn into_prompt(self) -> Result<PopularPrompt, RepositoryError> {
        Ok(PopularPrompt {
            id: parse_uuid(&self.id)?,
            prompt: self.prompt,
            count: self.count as u32,
            last_used_at: parse_datetime(&self.last_used_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Cosine similarity of two vectors; 0.0 for mismatched lengths or a zero
/// norm.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn parse_uuid(s: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid prompt id: {e}")))
}

fn parse_embedding(s: &str) -> Result<Vec<f32>, RepositoryError> {
    serde_json::from_str(s).map_err(|e| RepositoryError::Query(format!("invalid embedding: {e}")))
}

fn encode_embedding(embedding: &[f32]) -> Result<String, RepositoryError> {
    serde_json::to_string(embedding)
        .map_err(|e| RepositoryError::Query(format!("failed to encode embedding: {e}")))
}

impl PromptRepository for SqlitePromptRepository {
    async fn find_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<SimilarPrompt>, RepositoryError> {
        let rows = sqlx::query("SELECT id, prompt, count, embedding FROM user_prompts")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut matches = Vec::new();
        for row in &rows {
            let id: String = row
                .try_get("id")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let prompt: String = row
                .try_get("prompt")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let count: i64 = row
                .try_get("count")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let stored: String = row
                .try_get("embedding")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

            let similarity = cosine_similarity(embedding, &parse_embedding(&stored)?);
            if similarity >= threshold {
                matches.push(SimilarPrompt {
                    id: parse_uuid(&id)?,
                    prompt,
                    similarity,
                    count: count as u32,
                });
            }
        }

        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn find_exact(&self, prompt: &str) -> Result<Option<PopularPrompt>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, prompt, count, last_used_at FROM user_prompts WHERE prompt = ?",
        )
        .bind(prompt)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let prompt_row = PromptRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(prompt_row.into_prompt()?))
            }
            None => Ok(None),
        }
    }

    async fn increment(
        &self,
        id: &Uuid,
        last_used_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE user_prompts SET count = count + 1, last_used_at = ? WHERE id = ?",
        )
        .bind(last_used_at.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn insert(
        &self,
        prompt: &PopularPrompt,
        embedding: &[f32],
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO user_prompts (id, prompt, count, embedding, last_used_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(prompt.id.to_string())
        .bind(&prompt.prompt)
        .bind(prompt.count as i64)
        .bind(encode_embedding(embedding)?)
        .bind(prompt.last_used_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn top_prompts(&self, limit: usize) -> Result<Vec<PopularPrompt>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, prompt, count, last_used_at FROM user_prompts ORDER BY count DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let prompt_row = PromptRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                prompt_row.into_prompt()
            })
            .collect()
    }
}
