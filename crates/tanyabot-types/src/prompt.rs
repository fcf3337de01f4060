//! Popular-prompt tracking types.
//!
//! A popular prompt is a distinct question text with a usage counter driven
//! by exact repeats and by semantic-similarity matches: popularity reflects
//! "semantic traffic", not just identical strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked question text with its usage counter.
///
/// `count` starts at 1 on first occurrence and is monotonically
/// non-decreasing. Uniqueness of the canonical record is by exact text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularPrompt {
    pub id: Uuid,
    pub prompt: String,
    pub count: u32,
    pub last_used_at: DateTime<Utc>,
}

impl PopularPrompt {
    /// Build a fresh record for a prompt seen for the first time.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            prompt: prompt.into(),
            count: 1,
            last_used_at: Utc::now(),
        }
    }
}

/// A similarity-search candidate: an existing prompt with its cosine
/// similarity to the query embedding and its current counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarPrompt {
    pub id: Uuid,
    pub prompt: String,
    pub similarity: f32,
    pub count: u32,
}
