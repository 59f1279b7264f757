//! Text embeddings for chunks, tool descriptions, and questions.
//!
//! `OpenAiEmbedding` talks to an OpenAI-compatible `/embeddings` endpoint;
//! `MockEmbedding` hashes words into buckets so tests run offline.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::info;

use wikichat_core::config::LlmConfig;
use wikichat_core::Secrets;

use crate::error::IndexError;

/// Turns text into a vector comparable by cosine similarity.
pub trait EmbeddingService: Send + Sync {
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, IndexError>> + Send;

    fn dimensions(&self) -> usize;
}

/// Boxed-future form of [`EmbeddingService`], usable as
/// `Arc<dyn DynEmbeddingService>` by the vector tool and the router.
pub trait DynEmbeddingService: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>>;

    fn dimensions(&self) -> usize;
}

impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>>
    {
        Box::pin(self.embed(text))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }
}

// ---------------------------------------------------------------------------
// OpenAiEmbedding - remote embeddings
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embeddings from an OpenAI-compatible API.
pub struct OpenAiEmbedding {
    client: Client,
    api_base: String,
    model: String,
    api_key: SecretString,
    dimensions: usize,
}

impl std::fmt::Debug for OpenAiEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedding")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl OpenAiEmbedding {
    /// Output size of `text-embedding-ada-002` and `text-embedding-3-small`.
    pub const DEFAULT_DIMENSIONS: usize = 1536;

    pub fn new(config: &LlmConfig, secrets: &Secrets) -> Result<Self, IndexError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| IndexError::Embedding(format!("HTTP client: {}", e)))?;

        info!(model = %config.embedding_model, "OpenAI embedding service configured");

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
            api_key: SecretString::from(secrets.openai_key().to_string()),
            dimensions: Self::DEFAULT_DIMENSIONS,
        })
    }
}

impl EmbeddingService for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        if text.trim().is_empty() {
            return Err(IndexError::Embedding("Cannot embed empty text".to_string()));
        }

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .json(&serde_json::json!({
                "model": &self.model,
                "input": text,
            }))
            .send()
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::Embedding(format!("{}: {}", status, body)));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Embedding(format!("malformed response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| IndexError::Embedding("response contained no embedding".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// MockEmbedding - offline bag-of-words vectors
// ---------------------------------------------------------------------------

/// Hashes each lowercase word into one of 384 buckets and normalizes.
/// Texts that share words end up with positive cosine similarity.
#[derive(Debug, Clone, Default)]
pub struct MockEmbedding;

impl MockEmbedding {
    pub const DIMENSIONS: usize = 384;

    pub fn new() -> Self {
        Self
    }

    fn words_to_vector(text: &str) -> Vec<f32> {
        let mut buckets = vec![0.0f32; Self::DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut state = DefaultHasher::new();
            word.to_lowercase().hash(&mut state);
            buckets[(state.finish() % Self::DIMENSIONS as u64) as usize] += 1.0;
        }

        let length = buckets.iter().map(|v| v * v).sum::<f32>().sqrt();
        if length > 0.0 {
            buckets.iter_mut().for_each(|v| *v /= length);
        }
        buckets
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        if text.trim().is_empty() {
            return Err(IndexError::Embedding("Cannot embed empty text".to_string()));
        }
        Ok(Self::words_to_vector(text))
    }

    fn dimensions(&self) -> usize {
        Self::DIMENSIONS
    }
}
