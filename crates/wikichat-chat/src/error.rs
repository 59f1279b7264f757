//! Error types for the chat session layer.

use wikichat_core::error::WikichatError;

/// Errors from handling a chat submission.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("unknown example question: {0}")]
    UnknownExample(usize),
    #[error("answer failed: {0}")]
    Answer(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<WikichatError> for ChatError {
    fn from(err: WikichatError) -> Self {
        match err {
            WikichatError::Answer(msg) => ChatError::Answer(msg),
            other => ChatError::Answer(other.to_string()),
        }
    }
}

impl From<ChatError> for WikichatError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Answer(msg) => WikichatError::Answer(msg),
            other => WikichatError::Api(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::UnknownExample(7).to_string(),
            "unknown example question: 7"
        );
        assert_eq!(
            ChatError::Answer("timeout".to_string()).to_string(),
            "answer failed: timeout"
        );

        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            ChatError::SessionNotFound(id).to_string(),
            "session not found: 550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn test_answer_error_keeps_message() {
        let err: ChatError = WikichatError::Answer("LLM error: 429".to_string()).into();
        assert!(matches!(err, ChatError::Answer(ref m) if m == "LLM error: 429"));
    }

    #[test]
    fn test_other_core_errors_become_answer_errors() {
        let err: ChatError = WikichatError::Index("page not found".to_string()).into();
        assert!(matches!(err, ChatError::Answer(_)));
        assert!(err.to_string().contains("page not found"));
    }

    #[test]
    fn test_into_wikichat_error() {
        let err: WikichatError = ChatError::Answer("boom".to_string()).into();
        assert!(matches!(err, WikichatError::Answer(_)));
        let err: WikichatError = ChatError::EmptyMessage.into();
        assert!(matches!(err, WikichatError::Api(_)));
    }
}
