//! ChatRepository trait definition.
//!
//! Durable persistence for sessions and turns. Implementations live in
//! tanyabot-infra (e.g., `SqliteChatRepository`). Uses native async fn in
//! traits (RPITIT, Rust 2024 edition).

use tanyabot_types::chat::{Session, Turn};
use tanyabot_types::error::RepositoryError;

/// Repository trait for session and turn persistence.
pub trait ChatRepository: Send + Sync {
    /// Look up a session by its client-supplied id.
    fn find_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// Insert a session if absent.
    ///
    /// Idempotent at the store boundary (insert-if-absent), so two turns
    /// racing to create the same new session never surface a duplicate-key
    /// error to the orchestrator.
    fn insert_session(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append a turn. Turns are never updated or deleted.
    fn insert_turn(
        &self,
        turn: &Turn,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All turns of a session, ordered by created_at ASC.
    fn get_turns(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Turn>, RepositoryError>> + Send;
}
