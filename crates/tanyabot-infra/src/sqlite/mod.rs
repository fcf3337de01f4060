//! SQLite persistence: split reader/writer pools and repository
//! implementations for sessions, turns, and popular prompts.

pub mod chat;
pub mod pool;
pub mod prompt;

pub use chat::SqliteChatRepository;
pub use pool::DatabasePool;
pub use prompt::SqlitePromptRepository;
