//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `tanyabot-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, RFC 3339 timestamps.
//! Session creation is `INSERT OR IGNORE`, so racing first turns of a new
//! session never surface a duplicate-key error.

use tanyabot_core::chat::repository::ChatRepository;
use tanyabot_types::chat::{Session, Turn, TurnKind};
use tanyabot_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    id: String,
    user_id: String,
    created_at: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_session(self) -> Result<Session, RepositoryError> {
        Ok(Session {
            id: self.id,
            user_id: self.user_id,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct TurnRow {
    id: String,
    session_id: String,
    message_type: String,
    body: String,
    created_at: String,
    response_duration_ms: Option<i64>,
}

impl TurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            message_type: row.try_get("message_type")?,
            body: row.try_get("body")?,
            created_at: row.try_get("created_at")?,
            response_duration_ms: row.try_get("response_duration_ms")?,
        })
    }

    fn into_turn(self) -> Result<Turn, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid turn id: {e}")))?;
        let kind: TurnKind = self
            .message_type
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Turn {
            id,
            session_id: self.session_id,
            kind,
            body: self.body,
            created_at: parse_datetime(&self.created_at)?,
            response_duration_ms: self.response_duration_ms.map(|v| v as u64),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn find_session(&self, session_id: &str) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row =
                    SessionRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn insert_session(&self, session: &Session) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT OR IGNORE INTO sessions (id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(format_datetime(&session.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn insert_turn(&self, turn: &Turn) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO messages (id, session_id, message_type, body, created_at, response_duration_ms)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(turn.id.to_string())
        .bind(&turn.session_id)
        .bind(turn.kind.to_string())
        .bind(&turn.body)
        .bind(format_datetime(&turn.created_at))
        .bind(turn.response_duration_ms.map(|v| v as i64))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_turns(&self, session_id: &str) -> Result<Vec<Turn>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM messages WHERE session_id = ? ORDER BY created_at ASC")
            .bind(session_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                TurnRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_turn()
            })
            .collect()
    }
}
