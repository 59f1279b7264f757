//! The answering seam between the chat session and the index.

use async_trait::async_trait;

use crate::error::Result;

/// Anything that can turn a question into answer text.
///
/// The production implementation routes the question to one of several
/// query-engine tools; tests substitute a stub.
#[async_trait]
pub trait AnswerRouter: Send + Sync {
    /// Answer `question`. Failures are reported as `WikichatError::Answer`.
    async fn query(&self, question: &str) -> Result<String>;
}

#[async_trait]
impl<T: AnswerRouter + ?Sized> AnswerRouter for std::sync::Arc<T> {
    async fn query(&self, question: &str) -> Result<String> {
        (**self).query(question).await
    }
}
