//! Conversation orchestrator.
//!
//! `ConversationService` composes the whole request-response cycle: snapshot
//! per-session history, rewrite the question to standalone form, retrieve
//! reference passages, generate the persona-constrained answer, persist both
//! turns, and kick off best-effort popularity tracking in a detached task.
//!
//! The conversation must always get a reply: any failure in the
//! rewrite/retrieve/generate chain is absorbed into [`FALLBACK_REPLY`], and
//! persistence failures are logged, never surfaced.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};

use tanyabot_types::chat::{Session, Turn};
use tanyabot_types::error::{ConversationError, LlmError};

use crate::chat::repository::ChatRepository;
use crate::classify::is_interrogative;
use crate::history::ConversationHistoryStore;
use crate::llm::{Embedder, TextGenerator};
use crate::popularity::repository::PromptRepository;
use crate::popularity::tracker::PopularityTracker;
use crate::prompts::{render_answer, render_standalone_question};
use crate::retrieval::{ContextRetriever, PassageSearch, RetrieveError};
use crate::transcript::format_conv_history;

/// User-safe reply returned whenever the pipeline fails before an answer
/// exists. Never carries error details.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I encountered an error. Please try again or contact support.";

/// Which pipeline stage failed; logged, never shown to the user.
#[derive(Debug)]
enum PipelineError {
    Rewrite(LlmError),
    Retrieve(RetrieveError),
    Answer(LlmError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Rewrite(e) => write!(f, "standalone rewrite failed: {e}"),
            PipelineError::Retrieve(e) => write!(f, "retrieval failed: {e}"),
            PipelineError::Answer(e) => write!(f, "answer generation failed: {e}"),
        }
    }
}

/// Orchestrates one `converse` call end to end.
///
/// Generic over its collaborators so the core never depends on
/// tanyabot-infra. The embedder and prompt repository are `'static` because
/// the popularity tracker outlives the request in a detached task.
pub struct ConversationService<C, G, E, S, P>
where
    C: ChatRepository,
    G: TextGenerator,
    E: Embedder + 'static,
    S: PassageSearch,
    P: PromptRepository + 'static,
{
    history: Arc<ConversationHistoryStore>,
    chat_repo: C,
    generator: G,
    retriever: ContextRetriever<E, S>,
    tracker: Arc<PopularityTracker<E, P>>,
}

impl<C, G, E, S, P> ConversationService<C, G, E, S, P>
where
    C: ChatRepository,
    G: TextGenerator,
    E: Embedder + 'static,
    S: PassageSearch,
    P: PromptRepository + 'static,
{
    pub fn new(
        history: Arc<ConversationHistoryStore>,
        chat_repo: C,
        generator: G,
        retriever: ContextRetriever<E, S>,
        tracker: Arc<PopularityTracker<E, P>>,
    ) -> Self {
        Self {
            history,
            chat_repo,
            generator,
            retriever,
            tracker,
        }
    }

    /// Access the in-memory history store.
    pub fn history(&self) -> &ConversationHistoryStore {
        &self.history
    }

    /// Access the chat repository (history readback for callers).
    pub fn chat_repo(&self) -> &C {
        &self.chat_repo
    }

    /// Access the popularity tracker (top-prompts readback for callers).
    pub fn tracker(&self) -> &PopularityTracker<E, P> {
        &self.tracker
    }

    /// Run one conversation turn.
    ///
    /// The only error is the precondition violation for a blank session id;
    /// everything else resolves to `Ok` with either the generated answer or
    /// [`FALLBACK_REPLY`].
    #[tracing::instrument(name = "converse", skip(self, question, user_id))]
    pub async fn converse(
        &self,
        question: &str,
        session_id: &str,
        user_id: &str,
    ) -> Result<String, ConversationError> {
        if session_id.trim().is_empty() {
            return Err(ConversationError::MissingSessionId);
        }

        let received_at = Utc::now();
        let started = Instant::now();

        let prior_turns = self.history.snapshot(session_id);
        let conv_history = format_conv_history(&prior_turns);

        // Durable write path. The session row goes first so the turn's
        // foreign key holds; both writes are logged-and-swallowed because a
        // persistence hiccup must not cost the user their answer.
        self.ensure_session(session_id, user_id).await;
        let question_turn = Turn::question(session_id, question, received_at);
        if let Err(e) = self.chat_repo.insert_turn(&question_turn).await {
            warn!(session_id, error = %e, "Failed to persist question turn");
        }

        let answer = match self.run_pipeline(question, &conv_history).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(session_id, error = %e, "Conversation pipeline failed");
                return Ok(FALLBACK_REPLY.to_string());
            }
        };

        // History stores the ORIGINAL question text, not the rewrite.
        self.history.append_exchange(session_id, question, &answer);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let response_turn = Turn::response(session_id, &answer, elapsed_ms);
        if let Err(e) = self.chat_repo.insert_turn(&response_turn).await {
            warn!(session_id, error = %e, "Failed to persist response turn");
        }

        if is_interrogative(question) {
            let tracker = Arc::clone(&self.tracker);
            let tracked_question = question.to_string();
            // Detached: the reply does not wait for tracking, and a process
            // exit while this is in flight simply loses the increments.
            tokio::spawn(async move {
                tracker.track(&tracked_question).await;
            });
        }

        info!(session_id, elapsed_ms, "Conversation turn completed");
        Ok(answer)
    }

    /// Rewrite -> retrieve -> generate. Any error aborts to the fallback.
    async fn run_pipeline(
        &self,
        question: &str,
        conv_history: &str,
    ) -> Result<String, PipelineError> {
        let standalone_question = self
            .generator
            .generate(&render_standalone_question(conv_history, question))
            .await
            .map_err(PipelineError::Rewrite)?;

        let context = self
            .retriever
            .retrieve(&standalone_question)
            .await
            .map_err(PipelineError::Retrieve)?;

        self.generator
            .generate(&render_answer(&context, conv_history, question))
            .await
            .map_err(PipelineError::Answer)
    }

    /// Insert-if-absent for the session row. A concurrent insert of the same
    /// new session is benign because the store-level insert is idempotent.
    async fn ensure_session(&self, session_id: &str, user_id: &str) {
        match self.chat_repo.find_session(session_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let session = Session::new(session_id, user_id);
                if let Err(e) = self.chat_repo.insert_session(&session).await {
                    warn!(session_id, error = %e, "Failed to create session");
                } else {
                    info!(session_id, user_id, "Created session");
                }
            }
            Err(e) => {
                warn!(session_id, error = %e, "Session lookup failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use chrono::DateTime;
    use tanyabot_types::chat::TurnKind;
    use tanyabot_types::error::{RepositoryError, SearchError};
    use tanyabot_types::prompt::{PopularPrompt, SimilarPrompt};
    use tanyabot_types::retrieval::RetrievedPassage;
    use uuid::Uuid;

    // --- Fakes -----------------------------------------------------------

    #[derive(Default)]
    struct FakeChatRepo {
        sessions: Mutex<Vec<Session>>,
        turns: Mutex<Vec<Turn>>,
    }

    impl ChatRepository for FakeChatRepo {
        async fn find_session(&self, session_id: &str) -> Result<Option<Session>, RepositoryError> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == session_id)
                .cloned())
        }

        async fn insert_session(&self, session: &Session) -> Result<(), RepositoryError> {
            let mut sessions = self.sessions.lock().unwrap();
            if !sessions.iter().any(|s| s.id == session.id) {
                sessions.push(session.clone());
            }
            Ok(())
        }

        async fn insert_turn(&self, turn: &Turn) -> Result<(), RepositoryError> {
            self.turns.lock().unwrap().push(turn.clone());
            Ok(())
        }

        async fn get_turns(&self, session_id: &str) -> Result<Vec<Turn>, RepositoryError> {
            let mut turns: Vec<Turn> = self
                .turns
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.session_id == session_id)
                .cloned()
                .collect();
            turns.sort_by_key(|t| t.created_at);
            Ok(turns)
        }
    }

    /// Scripted generator: rewrite prompts echo back a marked standalone
    /// question, answer prompts produce numbered answers. Records every
    /// prompt it sees.
    struct FakeGenerator {
        prompts_seen: Mutex<Vec<String>>,
        fail: bool,
        delay: Option<std::time::Duration>,
    }

    impl FakeGenerator {
        fn new() -> Self {
            Self {
                prompts_seen: Mutex::new(Vec::new()),
                fail: false,
                delay: None,
            }
        }

        fn failing() -> Self {
            Self {
                prompts_seen: Mutex::new(Vec::new()),
                fail: true,
                delay: None,
            }
        }

        /// Sleeps for `delay` on every call, to make the pipeline take a
        /// known minimum amount of wall-clock time.
        fn slow(delay: std::time::Duration) -> Self {
            Self {
                prompts_seen: Mutex::new(Vec::new()),
                fail: false,
                delay: Some(delay),
            }
        }
    }

    impl TextGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            if self.fail {
                return Err(LlmError::Provider {
                    message: "model unavailable".to_string(),
                });
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let mut seen = self.prompts_seen.lock().unwrap();
            seen.push(prompt.to_string());
            if prompt.starts_with("Given some conversation history") {
                Ok("standalone question".to_string())
            } else {
                Ok(format!("answer-{}", seen.len()))
            }
        }

        fn model_name(&self) -> &str {
            "test-chat"
        }
    }

    struct FakeEmbedder;

    impl Embedder for FakeEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
            Ok(vec![0.5, 0.5])
        }

        fn model_name(&self) -> &str {
            "test-embedding"
        }
    }

    struct FakeSearch {
        fail: bool,
    }

    impl PassageSearch for FakeSearch {
        async fn find_passages(
            &self,
            _embedding: &[f32],
            _limit: usize,
        ) -> Result<Vec<RetrievedPassage>, SearchError> {
            if self.fail {
                return Err(SearchError::Http("connection refused".to_string()));
            }
            Ok(vec![RetrievedPassage {
                content: "reference passage".to_string(),
                similarity: 0.9,
            }])
        }
    }

    #[derive(Default)]
    struct FakePromptRepo {
        inserted: Mutex<Vec<String>>,
        increments: Mutex<Vec<Uuid>>,
    }

    impl PromptRepository for FakePromptRepo {
        async fn find_similar(
            &self,
            _embedding: &[f32],
            _threshold: f32,
            _limit: usize,
        ) -> Result<Vec<SimilarPrompt>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn find_exact(
            &self,
            _prompt: &str,
        ) -> Result<Option<PopularPrompt>, RepositoryError> {
            Ok(None)
        }

        async fn increment(
            &self,
            id: &Uuid,
            _last_used_at: DateTime<Utc>,
        ) -> Result<(), RepositoryError> {
            self.increments.lock().unwrap().push(*id);
            Ok(())
        }

        async fn insert(
            &self,
            prompt: &PopularPrompt,
            _embedding: &[f32],
        ) -> Result<(), RepositoryError> {
            self.inserted.lock().unwrap().push(prompt.prompt.clone());
            Ok(())
        }

        async fn top_prompts(&self, _limit: usize) -> Result<Vec<PopularPrompt>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    type TestService =
        ConversationService<FakeChatRepo, FakeGenerator, FakeEmbedder, FakeSearch, FakePromptRepo>;

    fn service(generator: FakeGenerator, search_fails: bool) -> TestService {
        let embedder = Arc::new(FakeEmbedder);
        let retriever = ContextRetriever::new(
            Arc::clone(&embedder),
            FakeSearch { fail: search_fails },
            4,
        );
        let tracker = Arc::new(PopularityTracker::new(embedder, FakePromptRepo::default()));
        ConversationService::new(
            Arc::new(ConversationHistoryStore::new()),
            FakeChatRepo::default(),
            generator,
            retriever,
            tracker,
        )
    }

    /// Let detached tasks spawned by `converse` run to completion on the
    /// current-thread test runtime.
    async fn drain_background_tasks() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    // --- Tests -----------------------------------------------------------

    #[tokio::test]
    async fn test_two_turns_leave_four_history_entries_in_order() {
        let svc = service(FakeGenerator::new(), false);

        let a1 = svc.converse("tell me about rain", "s1", "u1").await.unwrap();
        let a2 = svc.converse("tell me more", "s1", "u1").await.unwrap();

        let history = svc.history().snapshot("s1");
        assert_eq!(
            history,
            vec!["tell me about rain".to_string(), a1, "tell me more".to_string(), a2]
        );
    }

    #[tokio::test]
    async fn test_second_turn_sees_prior_transcript() {
        let svc = service(FakeGenerator::new(), false);

        let a1 = svc.converse("tell me about rain", "s1", "u1").await.unwrap();
        svc.converse("tell me more", "s1", "u1").await.unwrap();

        let prompts = svc.generator.prompts_seen.lock().unwrap().clone();
        // Prompts 3 and 4 belong to the second turn; both must carry the
        // first exchange in their transcript slot.
        let expected = format!("Human: tell me about rain\nAI: {a1}");
        assert!(prompts[2].contains(&expected));
        assert!(prompts[3].contains(&expected));
        // And the first turn saw an empty transcript.
        assert!(prompts[0].contains("Conversation history: \n"));
    }

    #[tokio::test]
    async fn test_generator_failure_returns_fallback_reply() {
        let svc = service(FakeGenerator::failing(), false);

        let reply = svc.converse("tell me about rain", "s1", "u1").await.unwrap();

        assert_eq!(reply, FALLBACK_REPLY);
        // The failed exchange is not recorded in memory and no response turn
        // is written; the question turn was already persisted.
        assert!(svc.history().is_empty("s1"));
        let turns = svc.chat_repo().get_turns("s1").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].kind, TurnKind::Question);
    }

    #[tokio::test]
    async fn test_search_failure_returns_fallback_reply() {
        let svc = service(FakeGenerator::new(), true);

        let reply = svc.converse("tell me about rain", "s1", "u1").await.unwrap();

        assert_eq!(reply, FALLBACK_REPLY);
        assert!(svc.history().is_empty("s1"));
    }

    #[tokio::test]
    async fn test_blank_session_id_is_a_precondition_violation() {
        let svc = service(FakeGenerator::new(), false);

        let err = svc.converse("tell me about rain", "  ", "u1").await.unwrap_err();

        assert!(matches!(err, ConversationError::MissingSessionId));
    }

    #[tokio::test]
    async fn test_session_row_created_exactly_once() {
        let svc = service(FakeGenerator::new(), false);

        svc.converse("tell me about rain", "s1", "u1").await.unwrap();
        svc.converse("tell me more", "s1", "u1").await.unwrap();

        let sessions = svc.chat_repo().sessions.lock().unwrap().clone();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "s1");
        assert_eq!(sessions[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_turns_persisted_with_duration_on_response_only() {
        let svc = service(FakeGenerator::new(), false);

        svc.converse("tell me about rain", "s1", "u1").await.unwrap();

        let turns = svc.chat_repo().get_turns("s1").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].kind, TurnKind::Question);
        assert!(turns[0].response_duration_ms.is_none());
        assert_eq!(turns[1].kind, TurnKind::Response);
        assert!(turns[1].response_duration_ms.is_some());
        // Question timestamp is not later than the response timestamp.
        assert!(turns[0].created_at <= turns[1].created_at);
    }

    #[tokio::test]
    async fn test_response_duration_tracks_pipeline_elapsed_time() {
        // The generator runs twice per turn (rewrite + answer), so a 30ms
        // delay per call puts a 60ms floor under the pipeline.
        let delay = std::time::Duration::from_millis(30);
        let svc = service(FakeGenerator::slow(delay), false);

        let started = Instant::now();
        svc.converse("tell me about rain", "s1", "u1").await.unwrap();
        let outer_elapsed_ms = started.elapsed().as_millis() as u64;

        let turns = svc.chat_repo().get_turns("s1").await.unwrap();
        let duration_ms = turns[1].response_duration_ms.unwrap();
        assert!(
            duration_ms >= 2 * delay.as_millis() as u64,
            "duration {duration_ms}ms below the injected {delay:?} x2 floor"
        );
        // The stored duration is measured inside converse, so it can never
        // exceed the elapsed time observed around the call.
        assert!(
            duration_ms <= outer_elapsed_ms,
            "duration {duration_ms}ms exceeds outer elapsed {outer_elapsed_ms}ms"
        );
    }

    #[tokio::test]
    async fn test_concurrent_sessions_do_not_cross_contaminate() {
        let svc = Arc::new(service(FakeGenerator::new(), false));

        let (r1, r2) = tokio::join!(
            svc.converse("question for session one", "s1", "u1"),
            svc.converse("question for session two", "s2", "u2"),
        );
        r1.unwrap();
        r2.unwrap();

        let h1 = svc.history().snapshot("s1");
        let h2 = svc.history().snapshot("s2");
        assert_eq!(h1.len(), 2);
        assert_eq!(h2.len(), 2);
        assert_eq!(h1[0], "question for session one");
        assert_eq!(h2[0], "question for session two");
    }

    #[tokio::test]
    async fn test_interrogative_question_triggers_tracking() {
        let svc = service(FakeGenerator::new(), false);

        svc.converse("What is rain?", "s1", "u1").await.unwrap();
        drain_background_tasks().await;

        let inserted = svc.tracker.prompts().inserted.lock().unwrap().clone();
        assert_eq!(inserted, vec!["What is rain?".to_string()]);
    }

    #[tokio::test]
    async fn test_non_interrogative_input_skips_tracking() {
        let svc = service(FakeGenerator::new(), false);

        svc.converse("tell me about rain", "s1", "u1").await.unwrap();
        drain_background_tasks().await;

        assert!(svc.tracker.prompts().inserted.lock().unwrap().is_empty());
    }
}
