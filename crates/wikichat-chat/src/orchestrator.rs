//! Chat orchestrator: session lifecycle plus question/answer turns.
//!
//! Every operation returns a [`TranscriptView`] so callers (the HTTP layer,
//! the one-shot CLI) only ever see a projection of the session.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use wikichat_core::config::WikichatConfig;
use wikichat_core::{AnswerRouter, ChatRole};

use crate::error::ChatError;
use crate::examples::{ExampleQuestions, Submission};
use crate::session::{PendingAnswer, SessionStore};
use crate::view::TranscriptView;

/// Coordinates sessions, submissions, and the answer router.
pub struct ChatOrchestrator {
    router: Arc<dyn AnswerRouter>,
    sessions: SessionStore,
    examples: ExampleQuestions,
    greeting: String,
}

impl ChatOrchestrator {
    pub fn new(
        router: Arc<dyn AnswerRouter>,
        greeting: impl Into<String>,
        examples: ExampleQuestions,
        session_timeout_minutes: u32,
    ) -> Self {
        Self {
            router,
            sessions: SessionStore::new(session_timeout_minutes),
            examples,
            greeting: greeting.into(),
        }
    }

    pub fn from_config(router: Arc<dyn AnswerRouter>, config: &WikichatConfig) -> Self {
        Self::new(
            router,
            config.chat.greeting.clone(),
            ExampleQuestions::new(config.page.examples.clone()),
            config.chat.session_timeout_minutes,
        )
    }

    pub fn examples(&self) -> &ExampleQuestions {
        &self.examples
    }

    /// Return the session's transcript, creating a greeted session when
    /// `session_id` is absent, unknown, or expired.
    pub async fn ensure_transcript(&self, session_id: Option<Uuid>) -> Result<TranscriptView, ChatError> {
        if let Some(id) = session_id {
            match self.render_transcript(id).await {
                Ok(view) => return Ok(view),
                Err(ChatError::SessionNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        let (_, handle) = self.sessions.create(&self.greeting)?;
        let session = handle.lock().await;
        Ok(TranscriptView::of(&session))
    }

    /// Projection of an existing session's transcript.
    pub async fn render_transcript(&self, session_id: Uuid) -> Result<TranscriptView, ChatError> {
        let session = self.sessions.active(session_id).await?;
        Ok(TranscriptView::of(&session))
    }

    /// Append a turn without consulting the router.
    pub async fn record_turn(
        &self,
        session_id: Uuid,
        role: ChatRole,
        content: impl fmt::Display,
    ) -> Result<TranscriptView, ChatError> {
        let mut session = self.sessions.active(session_id).await?;
        session.transcript.record_turn(role, content);
        session.touch();
        Ok(TranscriptView::of(&session))
    }

    /// Resolve a submission, record the question, ask the router, and
    /// record its answer.
    ///
    /// A blank question is rejected before the transcript is touched. When
    /// the router fails the question stays as the last turn and the error is
    /// returned; nothing is retried.
    pub async fn handle_submission(
        &self,
        session_id: Uuid,
        submission: Submission,
    ) -> Result<TranscriptView, ChatError> {
        let question = self.examples.resolve(&submission)?;
        // Held until the answer is recorded; a second submission waits here.
        let session = self.sessions.active(session_id).await?;
        let mut pending = PendingAnswer::begin(session, &question);

        let started = Instant::now();
        match self.router.query(&question).await {
            Ok(answer) => {
                pending.complete(&answer);
                info!(
                    session_id = %session_id,
                    turns = pending.transcript.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Submission answered"
                );
                Ok(TranscriptView::of(&pending))
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Submission failed");
                Err(e.into())
            }
        }
    }

    /// End a session and discard its transcript.
    pub fn delete_session(&self, session_id: Uuid) -> Result<(), ChatError> {
        self.sessions.remove(session_id)?;
        info!(session_id = %session_id, "Session ended");
        Ok(())
    }

    pub fn sweep_expired(&self) -> usize {
        self.sessions.sweep_expired()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
