//! Read-model projection of a transcript for display.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;
use wikichat_core::ChatRole;

use crate::session::{ChatSession, SessionState};

/// One rendered chat bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub role: ChatRole,
    pub content: String,
}

/// What a client needs to draw the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptView {
    pub session_id: Uuid,
    pub state: SessionState,
    pub entries: Vec<TranscriptEntry>,
}

impl TranscriptView {
    pub fn of(session: &ChatSession) -> Self {
        Self {
            session_id: session.id,
            state: session.state,
            entries: session
                .transcript
                .turns()
                .iter()
                .map(|turn| TranscriptEntry {
                    role: turn.role,
                    content: turn.content.clone(),
                })
                .collect(),
        }
    }

    /// The most recent assistant entry, if any.
    pub fn last_answer(&self) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.role == ChatRole::Assistant)
            .map(|e| e.content.as_str())
    }
}

/// Plain-text rendering, one `role: content` block per entry.
impl fmt::Display for TranscriptView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}: {}", entry.role, entry.content)?;
        }
        Ok(())
    }
}
