use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, WikichatError};

/// Top-level configuration for WikiChat.
///
/// Loaded from `~/.wikichat/config.toml` by default. Every section falls back
/// to its defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WikichatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub page: PageConfig,
}

impl WikichatConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: WikichatConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject settings the index builder or the router cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.corpus.page_title.trim().is_empty() {
            return Err(WikichatError::Config(
                "corpus.page_title must not be empty".to_string(),
            ));
        }
        if self.corpus.chunk_size == 0 {
            return Err(WikichatError::Config(
                "corpus.chunk_size must be positive".to_string(),
            ));
        }
        if self.corpus.chunk_overlap >= self.corpus.chunk_size {
            return Err(WikichatError::Config(format!(
                "corpus.chunk_overlap ({}) must be smaller than corpus.chunk_size ({})",
                self.corpus.chunk_overlap, self.corpus.chunk_size
            )));
        }
        if self.retrieval.similarity_top_k == 0 || self.retrieval.select_top_k == 0 {
            return Err(WikichatError::Config(
                "retrieval top_k values must be at least 1".to_string(),
            ));
        }
        if self.llm.context_window_units < self.corpus.chunk_size {
            return Err(WikichatError::Config(format!(
                "llm.context_window_units ({}) must fit one chunk ({})",
                self.llm.context_window_units, self.corpus.chunk_size
            )));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Maximum question submissions accepted per second across all sessions.
    pub rate_limit_per_sec: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            rate_limit_per_sec: 20,
        }
    }
}

/// The document that gets indexed and how it is chunked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Wikipedia page title.
    pub page_title: String,
    /// Wikipedia language edition.
    pub language: String,
    /// Chunk size in units (whitespace-delimited tokens).
    pub chunk_size: usize,
    /// Units carried over from the end of one chunk into the next.
    pub chunk_overlap: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            page_title: "Snowflake Inc.".to_string(),
            language: "en".to_string(),
            chunk_size: 1024,
            chunk_overlap: 20,
        }
    }
}

/// Answer-generation provider settings. The API key lives in [`crate::Secrets`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    pub api_base: String,
    /// Chat completion model.
    pub chat_model: String,
    /// Embedding model.
    pub embedding_model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Transport-level timeout for provider requests.
    pub request_timeout_secs: u64,
    /// Units of context packed into a single synthesis prompt.
    pub context_window_units: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            temperature: 0.1,
            request_timeout_secs: 120,
            context_window_units: 2048,
        }
    }
}

/// Retrieval and tool-routing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks returned by the vector index per question.
    pub similarity_top_k: usize,
    /// Tools queried per question. Answers are combined when more than one.
    pub select_top_k: usize,
    /// Description the router matches whole-document questions against.
    pub summary_tool_description: String,
    /// Description the router matches targeted-lookup questions against.
    pub vector_tool_description: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_top_k: 2,
            select_top_k: 1,
            summary_tool_description:
                "Useful for questions summarizing Snowflake's Wikipedia page".to_string(),
            vector_tool_description: "Useful for retrieving specific information about Snowflake"
                .to_string(),
        }
    }
}

/// Chat session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// The assistant turn every new transcript starts with.
    pub greeting: String,
    /// Idle minutes after which a session is considered ended.
    pub session_timeout_minutes: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: "Ask me a question about Snowflake!".to_string(),
            session_timeout_minutes: 60,
        }
    }
}

/// Static page content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub title: String,
    pub icon: String,
    /// Markdown shown in the info banner.
    pub info: String,
    /// Label above the example question pills.
    pub pill_prompt: String,
    pub input_placeholder: String,
    /// Canned example questions offered as pills.
    pub examples: Vec<String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Chat with Snowflake's Wikipedia page, powered by LlamaIndex".to_string(),
            icon: "🦙".to_string(),
            info: "Because this chatbot is powered by **LlamaIndex's \
                   [router query engine](https://gpt-index.readthedocs.io/en/latest/examples/query_engine/RetrieverRouterQueryEngine.html)**, \
                   it can answer both **summarization questions** and **context-specific questions** \
                   based on the contents of [Snowflake's Wikipedia page](https://en.wikipedia.org/wiki/Snowflake_Inc.)."
                .to_string(),
            pill_prompt: "Choose a question to get started or write your own below.".to_string(),
            input_placeholder: "Your question".to_string(),
            examples: vec![
                "What is Snowflake?".to_string(),
                "What company did Snowflake announce they would acquire in October 2023?"
                    .to_string(),
                "What company did Snowflake acquire in March 2022?".to_string(),
                "When did Snowflake IPO?".to_string(),
            ],
        }
    }
}
