use thiserror::Error;

/// Top-level error type for WikiChat.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for WikichatError` where the `?` operator needs to
/// cross a crate boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WikichatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing secret: {0}")]
    MissingSecret(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Answer failed: {0}")]
    Answer(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for WikichatError {
    fn from(err: toml::de::Error) -> Self {
        WikichatError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for WikichatError {
    fn from(err: toml::ser::Error) -> Self {
        WikichatError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for WikichatError {
    fn from(err: serde_json::Error) -> Self {
        WikichatError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for WikiChat operations.
pub type Result<T> = std::result::Result<T, WikichatError>;
