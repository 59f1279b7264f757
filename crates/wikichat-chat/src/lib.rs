//! Conversational session layer for WikiChat.
//!
//! Owns the per-session transcript, resolves submissions (typed questions or
//! example-question selections), and forwards questions to an
//! [`AnswerRouter`](wikichat_core::AnswerRouter).

pub mod error;
pub mod examples;
pub mod orchestrator;
pub mod session;
pub mod transcript;
pub mod view;

pub use error::ChatError;
pub use examples::{ExampleQuestions, Submission};
pub use orchestrator::ChatOrchestrator;
pub use session::{ChatSession, PendingAnswer, SessionState, SessionStore};
pub use transcript::Transcript;
pub use view::{TranscriptEntry, TranscriptView};
