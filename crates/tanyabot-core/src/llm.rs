//! Provider traits for text generation and embeddings.
//!
//! Both the generative model and the embeddings endpoint are external
//! collaborators; these traits are the seams. Implementations (OpenAI chat,
//! OpenAI embeddings) live in tanyabot-infra. Uses native async fn in traits
//! (RPITIT, Rust 2024 edition).

use tanyabot_types::error::LlmError;

/// Single-shot generative text call: rendered prompt in, raw text out.
///
/// No streaming, no structured parsing; the pipeline takes the model output
/// verbatim.
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;

    /// The chat model name (e.g., "gpt-4o-mini").
    fn model_name(&self) -> &str;
}

/// Embeds a single text into a vector for similarity search.
pub trait Embedder: Send + Sync {
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, LlmError>> + Send;

    /// The embedding model name (e.g., "text-embedding-3-small").
    fn model_name(&self) -> &str;
}
