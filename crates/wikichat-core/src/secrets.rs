//! Provider credentials.
//!
//! The OpenAI key comes from `OPENAI_API_KEY` or from a secrets TOML file
//! (`openai_key = "..."`). The environment wins when both are present. A
//! missing key is fatal at startup.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::info;

use crate::error::{Result, WikichatError};

/// Environment variable consulted for the provider key.
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Deserialize)]
struct SecretsFile {
    openai_key: Option<String>,
}

/// Credentials required at startup.
pub struct Secrets {
    openai_key: SecretString,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("openai_key", &"[REDACTED]")
            .finish()
    }
}

impl Secrets {
    /// Build from an explicit key.
    pub fn new(openai_key: impl Into<String>) -> Self {
        Self {
            openai_key: SecretString::from(openai_key.into()),
        }
    }

    /// Load from the process environment, then from `file` if given.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::resolve(std::env::var(OPENAI_KEY_ENV).ok(), file)
    }

    /// Resolve the key from an already-read environment value and an optional
    /// secrets file.
    pub fn resolve(env_value: Option<String>, file: Option<&Path>) -> Result<Self> {
        if let Some(key) = env_value.filter(|k| !k.trim().is_empty()) {
            info!("OpenAI key loaded from {}", OPENAI_KEY_ENV);
            return Ok(Self::new(key.trim()));
        }

        if let Some(path) = file {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let parsed: SecretsFile = toml::from_str(&content)?;
                if let Some(key) = parsed.openai_key.filter(|k| !k.trim().is_empty()) {
                    info!("OpenAI key loaded from {}", path.display());
                    return Ok(Self::new(key.trim()));
                }
            }
        }

        Err(WikichatError::MissingSecret(format!(
            "openai_key (set {} or add openai_key to the secrets file)",
            OPENAI_KEY_ENV
        )))
    }

    /// The provider key, for building request headers.
    pub fn openai_key(&self) -> &str {
        self.openai_key.expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn secrets_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_env_value_wins() {
        let file = secrets_file("openai_key = \"from-file\"\n");
        let secrets = Secrets::resolve(Some("from-env".to_string()), Some(file.path())).unwrap();
        assert_eq!(secrets.openai_key(), "from-env");
    }

    #[test]
    fn test_file_used_when_env_missing() {
        let file = secrets_file("openai_key = \"from-file\"\n");
        let secrets = Secrets::resolve(None, Some(file.path())).unwrap();
        assert_eq!(secrets.openai_key(), "from-file");
    }

    #[test]
    fn test_blank_env_falls_through() {
        let file = secrets_file("openai_key = \"from-file\"\n");
        let secrets = Secrets::resolve(Some("   ".to_string()), Some(file.path())).unwrap();
        assert_eq!(secrets.openai_key(), "from-file");
    }

    #[test]
    fn test_missing_everywhere_is_fatal() {
        let err = Secrets::resolve(None, Some(Path::new("/nonexistent/secrets.toml"))).unwrap_err();
        assert!(matches!(err, WikichatError::MissingSecret(_)));
    }

    #[test]
    fn test_file_without_key_is_fatal() {
        let file = secrets_file("other = \"value\"\n");
        assert!(Secrets::resolve(None, Some(file.path())).is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let secrets = Secrets::new("sk-very-secret");
        let dbg = format!("{:?}", secrets);
        assert!(!dbg.contains("sk-very-secret"));
        assert!(dbg.contains("REDACTED"));
    }
}
