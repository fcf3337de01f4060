//! LLM provider implementations: OpenAI chat completions and embeddings.

pub mod embeddings;
pub mod openai;

pub use embeddings::OpenAiEmbedder;
pub use openai::OpenAiGenerator;
