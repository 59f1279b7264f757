//! Chat sessions and the in-memory session store.
//!
//! A session is one browser tab's conversation. Each session sits behind its
//! own async mutex so that submissions to the same session are handled one
//! at a time, while different sessions proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use wikichat_core::ChatRole;

use crate::error::ChatError;
use crate::transcript::Transcript;

/// Where a session is in the greet / ask / answer cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Only the greeting has been shown.
    Greeted,
    /// The last turn is an assistant turn (or the last answer failed).
    AwaitingInput,
    /// A user turn was recorded and its answer is being computed.
    Answering,
}

/// One conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub state: SessionState,
    pub transcript: Transcript,
}

impl ChatSession {
    /// A fresh session whose transcript holds only `greeting`.
    pub fn new(greeting: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            started_at: now,
            last_active_at: now,
            state: SessionState::Greeted,
            transcript: Transcript::seeded(greeting),
        }
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }

    /// Whether the session has been idle longer than `timeout_minutes`.
    pub fn is_expired_at(&self, timeout_minutes: u32, now: DateTime<Utc>) -> bool {
        now - self.last_active_at > Duration::minutes(i64::from(timeout_minutes))
    }

    /// Record the question and move to [`SessionState::Answering`].
    pub fn begin_answer(&mut self, question: &str) {
        self.transcript.record_turn(ChatRole::User, question);
        self.state = SessionState::Answering;
        self.touch();
    }

    /// Record the answer for the pending question.
    pub fn complete_answer(&mut self, answer: &str) {
        debug_assert_eq!(self.transcript.last_role(), Some(ChatRole::User));
        self.transcript.record_turn(ChatRole::Assistant, answer);
        self.state = SessionState::AwaitingInput;
        self.touch();
    }

    /// Leave the pending question unanswered.
    pub fn abandon_answer(&mut self) {
        self.state = SessionState::AwaitingInput;
        self.touch();
    }
}

/// A locked session with a question awaiting its answer.
///
/// Dropping it before [`PendingAnswer::complete`] leaves the question
/// unanswered and returns the session to [`SessionState::AwaitingInput`],
/// including when the submitting future is cancelled mid-query.
#[derive(Debug)]
pub struct PendingAnswer {
    session: OwnedMutexGuard<ChatSession>,
}

impl PendingAnswer {
    /// Record `question` on the locked session and enter `Answering`.
    pub fn begin(mut session: OwnedMutexGuard<ChatSession>, question: &str) -> Self {
        session.begin_answer(question);
        Self { session }
    }

    /// Record the answer; the session is back to `AwaitingInput`.
    pub fn complete(&mut self, answer: &str) {
        self.session.complete_answer(answer);
    }
}

impl std::ops::Deref for PendingAnswer {
    type Target = ChatSession;

    fn deref(&self) -> &ChatSession {
        &self.session
    }
}

impl Drop for PendingAnswer {
    fn drop(&mut self) {
        if self.session.state == SessionState::Answering {
            self.session.abandon_answer();
        }
    }
}

/// All live sessions, keyed by id.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<ChatSession>>>>,
    timeout_minutes: u32,
}

impl SessionStore {
    pub fn new(timeout_minutes: u32) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            timeout_minutes,
        }
    }

    /// Insert a new greeted session and return its handle.
    pub fn create(&self, greeting: &str) -> Result<(Uuid, Arc<Mutex<ChatSession>>), ChatError> {
        let session = ChatSession::new(greeting);
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions
            .write()
            .map_err(|e| ChatError::Storage(format!("session lock poisoned: {}", e)))?
            .insert(id, Arc::clone(&handle));
        debug!(session_id = %id, "Session created");
        Ok((id, handle))
    }

    pub fn get(&self, id: Uuid) -> Result<Arc<Mutex<ChatSession>>, ChatError> {
        self.sessions
            .read()
            .map_err(|e| ChatError::Storage(format!("session lock poisoned: {}", e)))?
            .get(&id)
            .cloned()
            .ok_or(ChatError::SessionNotFound(id))
    }

    /// Lock a live session. An idle-expired session is removed and reported
    /// as not found, whether or not the sweeper has reached it yet.
    pub async fn active(&self, id: Uuid) -> Result<OwnedMutexGuard<ChatSession>, ChatError> {
        let session = self.get(id)?.lock_owned().await;
        if session.is_expired_at(self.timeout_minutes, Utc::now()) {
            drop(session);
            // A concurrent caller may have removed it first.
            let _ = self.remove(id);
            debug!(session_id = %id, "Expired session ended on access");
            return Err(ChatError::SessionNotFound(id));
        }
        Ok(session)
    }

    pub fn remove(&self, id: Uuid) -> Result<(), ChatError> {
        self.sessions
            .write()
            .map_err(|e| ChatError::Storage(format!("session lock poisoned: {}", e)))?
            .remove(&id)
            .map(|_| ())
            .ok_or(ChatError::SessionNotFound(id))
    }

    /// Drop every idle session. Sessions with a submission in flight are kept.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let Ok(mut sessions) = self.sessions.write() else {
            return 0;
        };
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !session.is_expired_at(self.timeout_minutes, now),
            Err(_) => true,
        });
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, "Expired sessions swept");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn timeout_minutes(&self) -> u32 {
        self.timeout_minutes
    }
}
