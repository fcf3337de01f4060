//! Popularity tracker: counts semantic traffic on asked questions.
//!
//! For each tracked question the tracker embeds the text, increments the
//! counters of semantically similar prior prompts, and upserts the exact-text
//! record. Everything is best-effort: any failure is logged and the remaining
//! steps continue where possible. The orchestrator runs this in a detached
//! task, so nothing here can affect the reply already returned to the user.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use tanyabot_types::prompt::{PopularPrompt, SimilarPrompt};

use crate::llm::Embedder;
use crate::popularity::repository::PromptRepository;

/// Coarse recall threshold passed to the similarity search itself.
const SEARCH_THRESHOLD: f32 = 0.6;

/// Maximum candidates requested from the similarity search.
const SEARCH_LIMIT: usize = 5;

/// Refinement floor: only candidates above this similarity count as
/// "similar" for the suggestion list.
const SIMILARITY_FLOOR: f32 = 0.7;

/// Suggestion list size.
const SUGGESTION_LIMIT: usize = 3;

/// Tracks popular prompts by exact text and by embedding similarity.
pub struct PopularityTracker<E: Embedder, P: PromptRepository> {
    embedder: Arc<E>,
    prompts: P,
}

impl<E: Embedder, P: PromptRepository> PopularityTracker<E, P> {
    pub fn new(embedder: Arc<E>, prompts: P) -> Self {
        Self { embedder, prompts }
    }

    /// Access the prompt repository (dashboard readback for callers).
    pub fn prompts(&self) -> &P {
        &self.prompts
    }

    /// Embed `question` and track it.
    ///
    /// If the embedding request fails, tracking is skipped entirely: no
    /// counter moves and the returned suggestion list is empty.
    pub async fn track(&self, question: &str) -> Vec<String> {
        let embedding = match self.embedder.embed(question).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "Skipping popularity tracking: embedding request failed");
                return Vec::new();
            }
        };

        self.track_embedded(question, &embedding).await
    }

    /// Track a question whose embedding is already known.
    ///
    /// The similar-prompt pass and the exact-text upsert are independent:
    /// a failure in one never blocks the other.
    pub async fn track_embedded(&self, question: &str, embedding: &[f32]) -> Vec<String> {
        let suggestions = self.bump_similar(question, embedding).await;
        self.upsert_exact(question, embedding).await;
        suggestions
    }

    /// Find prompts semantically close to the question, bump their counters,
    /// and return the top related prompts by popularity.
    async fn bump_similar(&self, question: &str, embedding: &[f32]) -> Vec<String> {
        let candidates = match self
            .prompts
            .find_similar(embedding, SEARCH_THRESHOLD, SEARCH_LIMIT)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "Similar-prompt search failed");
                return Vec::new();
            }
        };

        let question_lower = question.to_lowercase();
        let mut refined: Vec<&SimilarPrompt> = candidates
            .iter()
            .filter(|c| c.similarity > SIMILARITY_FLOOR && c.prompt.to_lowercase() != question_lower)
            .collect();

        // The whole recall set is incremented, but only when the refined set
        // is non-empty; the refined set itself only shapes the suggestion
        // list. An exact repeat with no distinct neighbors therefore gets its
        // single +1 from the exact-text upsert alone.
        if !refined.is_empty() {
            let now = Utc::now();
            for candidate in &candidates {
                if let Err(e) = self.prompts.increment(&candidate.id, now).await {
                    warn!(
                        prompt_id = %candidate.id,
                        error = %e,
                        "Failed to increment similar prompt"
                    );
                }
            }
        }

        refined.sort_by(|a, b| b.count.cmp(&a.count));
        refined
            .iter()
            .take(SUGGESTION_LIMIT)
            .map(|c| c.prompt.clone())
            .collect()
    }

    /// Increment the exact-text record, or create it with count 1.
    async fn upsert_exact(&self, question: &str, embedding: &[f32]) {
        match self.prompts.find_exact(question).await {
            Ok(Some(existing)) => {
                if let Err(e) = self.prompts.increment(&existing.id, Utc::now()).await {
                    warn!(prompt_id = %existing.id, error = %e, "Failed to bump existing prompt");
                } else {
                    debug!(prompt_id = %existing.id, "Bumped existing prompt");
                }
            }
            Ok(None) => {
                let record = PopularPrompt::new(question);
                if let Err(e) = self.prompts.insert(&record, embedding).await {
                    warn!(error = %e, "Failed to insert new prompt record");
                } else {
                    debug!(prompt_id = %record.id, "Inserted new prompt record");
                }
            }
            Err(e) => {
                warn!(error = %e, "Exact-prompt lookup failed");
            }
        }
    }
}
