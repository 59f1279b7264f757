//! Shared chat types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversational turn.
///
/// The role is fixed at creation and the content is already coerced to its
/// display form, so a turn never changes after it is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    /// Build a turn, coercing any displayable content to a string.
    pub fn new(role: ChatRole, content: impl fmt::Display) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }

    pub fn user(content: impl fmt::Display) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl fmt::Display) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}
