//! The append-only transcript of one chat session.

use std::fmt;

use serde::Serialize;
use wikichat_core::{ChatRole, ChatTurn};

/// Ordered turns of a conversation, starting with the assistant greeting.
///
/// Turns can only be appended. There is no API to edit, reorder, or remove
/// a turn once it has been recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    /// A new transcript holding exactly one assistant turn, the greeting.
    pub fn seeded(greeting: impl fmt::Display) -> Self {
        Self {
            turns: vec![ChatTurn::assistant(greeting)],
        }
    }

    /// Append a turn. `content` is stored in its display form.
    pub fn record_turn(&mut self, role: ChatRole, content: impl fmt::Display) -> &ChatTurn {
        self.turns.push(ChatTurn::new(role, content));
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    pub fn last_role(&self) -> Option<ChatRole> {
        self.turns.last().map(|t| t.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_holds_only_greeting() {
        let transcript = Transcript::seeded("Ask me a question about Snowflake!");
        assert_eq!(transcript.len(), 1);
        assert_eq!(
            transcript.turns()[0],
            ChatTurn::assistant("Ask me a question about Snowflake!")
        );
    }

    #[test]
    fn test_record_turn_appends_in_order() {
        let mut transcript = Transcript::seeded("hi");
        transcript.record_turn(ChatRole::User, "What is Snowflake?");
        transcript.record_turn(ChatRole::Assistant, "A data cloud company.");

        let roles: Vec<ChatRole> = transcript.turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::Assistant, ChatRole::User, ChatRole::Assistant]
        );
        assert_eq!(transcript.last().unwrap().content, "A data cloud company.");
    }

    #[test]
    fn test_record_turn_coerces_content() {
        struct Reply(u32);
        impl fmt::Display for Reply {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "reply #{}", self.0)
            }
        }

        let mut transcript = Transcript::seeded("hi");
        let turn = transcript.record_turn(ChatRole::Assistant, Reply(3));
        assert_eq!(turn.content, "reply #3");
    }

    #[test]
    fn test_record_turn_accepts_empty_content() {
        let mut transcript = Transcript::seeded("hi");
        transcript.record_turn(ChatRole::Assistant, "");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last_role(), Some(ChatRole::Assistant));
    }
}
