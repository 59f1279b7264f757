pub mod config;
pub mod error;
pub mod router;
pub mod secrets;
pub mod types;

pub use config::WikichatConfig;
pub use error::{Result, WikichatError};
pub use router::AnswerRouter;
pub use secrets::Secrets;
pub use types::{ChatRole, ChatTurn};
