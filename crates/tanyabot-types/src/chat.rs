//! Session and turn types for TanyaBot conversations.
//!
//! A session is a logical conversation thread owned by one user; a turn is
//! one durably recorded question or response within it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Kind of a recorded turn.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (message_type IN ('question', 'response'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Question,
    Response,
}

impl fmt::Display for TurnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnKind::Question => write!(f, "question"),
            TurnKind::Response => write!(f, "response"),
        }
    }
}

impl FromStr for TurnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "question" => Ok(TurnKind::Question),
            "response" => Ok(TurnKind::Response),
            other => Err(format!("invalid turn kind: '{other}'")),
        }
    }
}

/// A conversation thread identified by a stable, client-generated id.
///
/// Created on the first turn if absent; never deleted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Build a session created now, owned by the given user.
    pub fn new(id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// One question or response event within a session.
///
/// Turns are ordered by `created_at` ascending and are append-only:
/// never mutated or reordered once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub session_id: String,
    pub kind: TurnKind,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Elapsed wall-clock between question receipt and answer readiness,
    /// in milliseconds. Response turns only.
    pub response_duration_ms: Option<u64>,
}

impl Turn {
    /// Build a question turn with the given receipt timestamp.
    pub fn question(session_id: impl Into<String>, body: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id: session_id.into(),
            kind: TurnKind::Question,
            body: body.into(),
            created_at: at,
            response_duration_ms: None,
        }
    }

    /// Build a response turn stamped now, carrying the measured latency.
    pub fn response(
        session_id: impl Into<String>,
        body: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id: session_id.into(),
            kind: TurnKind::Response,
            body: body.into(),
            created_at: Utc::now(),
            response_duration_ms: Some(duration_ms),
        }
    }
}
