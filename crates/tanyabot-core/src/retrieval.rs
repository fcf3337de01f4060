//! Semantic retrieval of reference passages.
//!
//! `PassageSearch` is the seam to the external vector search service (the
//! index itself is not built here). `ContextRetriever` composes an embedder
//! with that search and combines the top-K passages into the single context
//! blob fed to the answer prompt. No caching: every call is a fresh lookup.

use std::sync::Arc;

use tanyabot_types::error::{LlmError, SearchError};
use tanyabot_types::retrieval::RetrievedPassage;

use crate::llm::Embedder;

/// External vector similarity search over the reference corpus.
///
/// Implementations live in tanyabot-infra (e.g., `PostgrestPassageSearch`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait PassageSearch: Send + Sync {
    /// Return up to `limit` passages most similar to the query embedding,
    /// best match first.
    fn find_passages(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<RetrievedPassage>, SearchError>> + Send;
}

/// Why a retrieval failed: either the embedding call or the search call.
#[derive(Debug)]
pub enum RetrieveError {
    Embed(LlmError),
    Search(SearchError),
}

impl std::fmt::Display for RetrieveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrieveError::Embed(e) => write!(f, "embedding failed: {e}"),
            RetrieveError::Search(e) => write!(f, "passage search failed: {e}"),
        }
    }
}

impl std::error::Error for RetrieveError {}

/// Join passage contents into one context blob, separated by blank lines.
pub fn combine_passages(passages: &[RetrievedPassage]) -> String {
    passages
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Embeds a standalone question and fetches the most relevant reference
/// passages as a single combined blob.
pub struct ContextRetriever<E: Embedder, S: PassageSearch> {
    embedder: Arc<E>,
    search: S,
    top_k: usize,
}

impl<E: Embedder, S: PassageSearch> ContextRetriever<E, S> {
    pub fn new(embedder: Arc<E>, search: S, top_k: usize) -> Self {
        Self {
            embedder,
            search,
            top_k,
        }
    }

    /// Retrieve the context blob for a standalone question.
    pub async fn retrieve(&self, standalone_question: &str) -> Result<String, RetrieveError> {
        let embedding = self
            .embedder
            .embed(standalone_question)
            .await
            .map_err(RetrieveError::Embed)?;

        let passages = self
            .search
            .find_passages(&embedding, self.top_k)
            .await
            .map_err(RetrieveError::Search)?;

        tracing::debug!(
            passage_count = passages.len(),
            "Retrieved reference passages"
        );

        Ok(combine_passages(&passages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(content: &str, similarity: f32) -> RetrievedPassage {
        RetrievedPassage {
            content: content.to_string(),
            similarity,
        }
    }

    #[test]
    fn test_combine_empty_is_empty() {
        assert_eq!(combine_passages(&[]), "");
    }

    #[test]
    fn test_combine_joins_with_blank_lines() {
        let passages = vec![passage("first", 0.9), passage("second", 0.8)];
        assert_eq!(combine_passages(&passages), "first\n\nsecond");
    }

    struct FixedEmbedder;

    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
            Ok(vec![0.1, 0.2, 0.3])
        }

        fn model_name(&self) -> &str {
            "test-embedding"
        }
    }

    struct FixedSearch(Vec<RetrievedPassage>);

    impl PassageSearch for FixedSearch {
        async fn find_passages(
            &self,
            _embedding: &[f32],
            limit: usize,
        ) -> Result<Vec<RetrievedPassage>, SearchError> {
            Ok(self.0.iter().take(limit).cloned().collect())
        }
    }

    struct FailingSearch;

    impl PassageSearch for FailingSearch {
        async fn find_passages(
            &self,
            _embedding: &[f32],
            _limit: usize,
        ) -> Result<Vec<RetrievedPassage>, SearchError> {
            Err(SearchError::Http("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_retrieve_combines_top_k() {
        let search = FixedSearch(vec![
            passage("alpha", 0.9),
            passage("beta", 0.8),
            passage("gamma", 0.7),
        ]);
        let retriever = ContextRetriever::new(Arc::new(FixedEmbedder), search, 2);
        let blob = retriever.retrieve("what is rain?").await.unwrap();
        assert_eq!(blob, "alpha\n\nbeta");
    }

    #[tokio::test]
    async fn test_retrieve_propagates_search_failure() {
        let retriever = ContextRetriever::new(Arc::new(FixedEmbedder), FailingSearch, 4);
        let err = retriever.retrieve("what is rain?").await.unwrap_err();
        assert!(matches!(err, RetrieveError::Search(_)));
    }
}
