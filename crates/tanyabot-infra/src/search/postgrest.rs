//! PostgREST-backed passage search.
//!
//! Implements [`PassageSearch`] against a PostgREST-compatible service
//! (e.g. Supabase) that exposes an RPC similarity-search function over
//! the reference-passage corpus. The RPC takes a query embedding and a
//! match count and returns passages ranked best-first; ordering is trusted
//! as returned.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use tanyabot_core::retrieval::PassageSearch;
use tanyabot_types::error::SearchError;
use tanyabot_types::retrieval::RetrievedPassage;

/// Passage search over a PostgREST RPC endpoint.
///
/// Does NOT derive Debug; the service key never appears in Debug output,
/// Display output, or tracing logs.
pub struct PostgrestPassageSearch {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    match_function: String,
}

#[derive(Debug, Serialize)]
struct MatchRequest<'a> {
    query_embedding: &'a [f32],
    match_count: usize,
}

#[derive(Debug, Deserialize)]
struct MatchRow {
    content: String,
    similarity: f32,
}

impl PostgrestPassageSearch {
    /// Create a new client against the given service base URL.
    pub fn new(
        base_url: impl Into<String>,
        match_function: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: base_url.into(),
            match_function: match_function.into(),
        }
    }

    fn rpc_url(&self) -> String {
        format!(
            "{}/rest/v1/rpc/{}",
            self.base_url.trim_end_matches('/'),
            self.match_function
        )
    }
}

impl PassageSearch for PostgrestPassageSearch {
    async fn find_passages(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>, SearchError> {
        let body = MatchRequest {
            query_embedding: embedding,
            match_count: limit,
        };

        let response = self
            .client
            .post(self.rpc_url())
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let rows: Vec<MatchRow> = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| RetrievedPassage {
                content: row.content,
                similarity: row.similarity,
            })
            .collect())
    }
}
