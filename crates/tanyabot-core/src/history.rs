//! In-memory per-session conversation history.
//!
//! `ConversationHistoryStore` is a process-wide cache of raw turn strings,
//! alternating question, answer, question, answer. It is NOT the source of
//! truth (the durable record lives in the turn store) and does not survive a
//! restart. Entries are never evicted, so memory grows with the number of
//! distinct sessions seen in a process lifetime; bounded LRU eviction could
//! be added without changing single-session behavior.

use dashmap::DashMap;

/// Process-wide map from session id to its alternating question/answer
/// history.
///
/// An entry exists iff at least one exchange has completed for that session
/// in this process, and its length is even after every completed exchange.
/// Two concurrent calls for the SAME session may interleave their appends;
/// that race is accepted and not guarded by a lock. Distinct sessions are
/// fully independent.
#[derive(Default)]
pub struct ConversationHistoryStore {
    entries: DashMap<String, Vec<String>>,
}

impl ConversationHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone the current history for a session, or an empty list if the
    /// session has no completed exchange yet. Does not create an entry.
    pub fn snapshot(&self, session_id: &str) -> Vec<String> {
        self.entries
            .get(session_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Append one completed exchange (original question text, then answer).
    ///
    /// Creates the entry on the first completed exchange. Appending both
    /// strings under one map guard keeps the even-length invariant visible
    /// to concurrent snapshots.
    pub fn append_exchange(&self, session_id: &str, question: &str, answer: &str) {
        let mut entry = self.entries.entry(session_id.to_string()).or_default();
        entry.push(question.to_string());
        entry.push(answer.to_string());
    }

    /// Number of stored strings for a session (0 if unknown).
    pub fn len(&self, session_id: &str) -> usize {
        self.entries.get(session_id).map(|e| e.len()).unwrap_or(0)
    }

    /// True if no completed exchange is recorded for the session.
    pub fn is_empty(&self, session_id: &str) -> bool {
        self.len(session_id) == 0
    }

    /// Number of sessions currently held in memory.
    pub fn session_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_of_unknown_session_is_empty() {
        let store = ConversationHistoryStore::new();
        assert!(store.snapshot("nope").is_empty());
        // Snapshot must not create an entry.
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn test_append_creates_entry_with_even_length() {
        let store = ConversationHistoryStore::new();
        store.append_exchange("s1", "q1", "a1");
        assert_eq!(store.len("s1"), 2);
        store.append_exchange("s1", "q2", "a2");
        assert_eq!(
            store.snapshot("s1"),
            vec!["q1", "a1", "q2", "a2"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = ConversationHistoryStore::new();
        store.append_exchange("s1", "q1", "a1");
        store.append_exchange("s2", "other q", "other a");
        assert_eq!(store.snapshot("s1"), vec!["q1".to_string(), "a1".to_string()]);
        assert_eq!(
            store.snapshot("s2"),
            vec!["other q".to_string(), "other a".to_string()]
        );
    }

    #[test]
    fn test_concurrent_appends_to_distinct_sessions() {
        use std::sync::Arc;

        let store = Arc::new(ConversationHistoryStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let sid = format!("session-{i}");
                for turn in 0..10 {
                    store.append_exchange(&sid, &format!("q{turn}"), &format!("a{turn}"));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..8 {
            let sid = format!("session-{i}");
            let history = store.snapshot(&sid);
            assert_eq!(history.len(), 20);
            // No cross-contamination: every entry belongs to this session's
            // own q/a sequence.
            assert_eq!(history[0], "q0");
            assert_eq!(history[19], "a9");
        }
    }
}
