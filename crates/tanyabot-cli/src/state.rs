//! Application state: wires config, pools, and clients into the service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use tanyabot_core::chat::service::ConversationService;
use tanyabot_core::history::ConversationHistoryStore;
use tanyabot_core::popularity::tracker::PopularityTracker;
use tanyabot_core::retrieval::ContextRetriever;
use tanyabot_infra::config::{load_global_config, openai_api_key, vector_search_key};
use tanyabot_infra::llm::{OpenAiEmbedder, OpenAiGenerator};
use tanyabot_infra::search::PostgrestPassageSearch;
use tanyabot_infra::sqlite::{DatabasePool, SqliteChatRepository, SqlitePromptRepository};

/// The fully wired conversation service.
pub type Service = ConversationService<
    SqliteChatRepository,
    OpenAiGenerator,
    OpenAiEmbedder,
    PostgrestPassageSearch,
    SqlitePromptRepository,
>;

/// Application state shared by all commands.
pub struct AppState {
    pub service: Service,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize config, database, and clients from the data directory.
    pub async fn init(data_dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_global_config(data_dir).await;

        if config.vector_search.base_url.is_empty() {
            anyhow::bail!(
                "vector_search.base_url is not set; add it to {}/config.toml",
                data_dir.display()
            );
        }

        let openai_key = openai_api_key().context("OPENAI_API_KEY is not set")?;
        let search_key = vector_search_key().context("VECTOR_SEARCH_KEY is not set")?;

        let db_path = data_dir.join("tanyabot.db");
        let database_url = format!("sqlite://{}", db_path.display());
        let pool = DatabasePool::new(&database_url, &config.database)
            .await
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;
        tracing::info!(db = %db_path.display(), chat_model = %config.chat_model, "initialized");

        let chat_repo = SqliteChatRepository::new(pool.clone());
        let prompt_repo = SqlitePromptRepository::new(pool);

        let generator = OpenAiGenerator::new(&openai_key, &config.chat_model);
        let embedder = Arc::new(OpenAiEmbedder::new(openai_key, &config.embedding_model));
        let search = PostgrestPassageSearch::new(
            &config.vector_search.base_url,
            &config.vector_search.match_function,
            search_key,
        );

        let retriever = ContextRetriever::new(embedder.clone(), search, config.retrieval_top_k);
        let tracker = Arc::new(PopularityTracker::new(embedder, prompt_repo));
        let history = Arc::new(ConversationHistoryStore::new());

        let service = ConversationService::new(history, chat_repo, generator, retriever, tracker);

        Ok(Self {
            service,
            data_dir: data_dir.to_path_buf(),
        })
    }
}
