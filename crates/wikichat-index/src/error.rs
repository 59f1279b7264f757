//! Error types for the index pipeline.

use wikichat_core::error::WikichatError;

/// Errors from loading, indexing, and answering.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("document source error: {0}")]
    DocumentSource(String),
    #[error("page not found: {0}")]
    PageNotFound(String),
    #[error("corpus is empty after loading '{0}'")]
    EmptyCorpus(String),
    #[error("invalid chunking: {0}")]
    InvalidChunking(String),
    #[error("question cannot be empty")]
    EmptyQuestion,
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("LLM error: {0}")]
    Llm(String),
    #[error("index storage error: {0}")]
    Storage(String),
    #[error("no tool matched the question")]
    NoToolSelected,
}

impl From<IndexError> for WikichatError {
    fn from(err: IndexError) -> Self {
        WikichatError::Index(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            IndexError::PageNotFound("Nope".to_string()).to_string(),
            "page not found: Nope"
        );
        assert_eq!(
            IndexError::EmptyCorpus("Snowflake Inc.".to_string()).to_string(),
            "corpus is empty after loading 'Snowflake Inc.'"
        );
        assert_eq!(
            IndexError::EmptyQuestion.to_string(),
            "question cannot be empty"
        );
    }

    #[test]
    fn test_into_wikichat_error() {
        let err: WikichatError = IndexError::Llm("rate limited".to_string()).into();
        assert!(matches!(err, WikichatError::Index(_)));
        assert!(err.to_string().contains("rate limited"));
    }
}
