//! Global configuration loader for TanyaBot.
//!
//! Reads `config.toml` from the data directory (`~/.tanyabot/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed. API keys are never part of the
//! config file; they come from the environment.

use std::path::Path;

use secrecy::SecretString;

use tanyabot_types::config::GlobalConfig;
use tanyabot_types::error::LlmError;

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Environment variable holding the vector search service key.
pub const VECTOR_SEARCH_KEY_VAR: &str = "VECTOR_SEARCH_KEY";

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Read the OpenAI API key from the environment.
pub fn openai_api_key() -> Result<SecretString, LlmError> {
    std::env::var(OPENAI_API_KEY_VAR)
        .map(SecretString::from)
        .map_err(|_| LlmError::MissingApiKey)
}

/// Read the vector search service key from the environment.
pub fn vector_search_key() -> Result<SecretString, LlmError> {
    std::env::var(VECTOR_SEARCH_KEY_VAR)
        .map(SecretString::from)
        .map_err(|_| LlmError::MissingApiKey)
}
