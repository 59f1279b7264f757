//! Document sources.
//!
//! [`WikipediaReader`] fetches the plain-text extract of one or more pages
//! from the MediaWiki API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::document::Document;
use crate::error::IndexError;

/// Anything that can load documents by page identifier.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Load one document per page, in order.
    async fn load(&self, pages: &[String]) -> Result<Vec<Document>, IndexError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    query: Option<ApiQuery>,
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    pages: Vec<ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    pageid: Option<u64>,
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    extract: Option<String>,
}

/// Loads full-article plain text from Wikipedia.
#[derive(Debug, Clone)]
pub struct WikipediaReader {
    client: Client,
    endpoint: String,
    language: String,
}

impl WikipediaReader {
    /// Reader for the given language edition (`"en"`, `"de"`, ...).
    pub fn new(language: &str, timeout: Duration) -> Result<Self, IndexError> {
        let endpoint = format!("https://{}.wikipedia.org/w/api.php", language);
        Self::with_endpoint(endpoint, language, timeout)
    }

    /// Reader against an explicit `api.php` endpoint.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        language: &str,
        timeout: Duration,
    ) -> Result<Self, IndexError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wikichat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IndexError::DocumentSource(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            language: language.to_string(),
        })
    }

    async fn fetch_page(&self, title: &str) -> Result<Document, IndexError> {
        let params = [
            ("action", "query"),
            ("prop", "extracts"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("format", "json"),
            ("formatversion", "2"),
            ("titles", title),
        ];

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| IndexError::DocumentSource(e.to_string()))?
            .error_for_status()
            .map_err(|e| IndexError::DocumentSource(e.to_string()))?;

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| IndexError::DocumentSource(format!("malformed response: {}", e)))?;

        let page = body
            .query
            .and_then(|q| q.pages.into_iter().next())
            .ok_or_else(|| IndexError::PageNotFound(title.to_string()))?;

        if page.missing || page.invalid {
            return Err(IndexError::PageNotFound(title.to_string()));
        }

        let text = page.extract.unwrap_or_default();
        let id = page
            .pageid
            .map(|id| id.to_string())
            .unwrap_or_else(|| page.title.clone());

        debug!(title = %page.title, chars = text.len(), "Fetched Wikipedia page");

        let mut doc = Document::new(id, page.title, text);
        doc.metadata = serde_json::json!({
            "source": "wikipedia",
            "language": &self.language,
            "requested_title": title,
        });
        Ok(doc)
    }
}

#[async_trait]
impl DocumentSource for WikipediaReader {
    async fn load(&self, pages: &[String]) -> Result<Vec<Document>, IndexError> {
        let mut documents = Vec::with_capacity(pages.len());
        for title in pages {
            documents.push(self.fetch_page(title).await?);
        }
        info!(pages = pages.len(), "Loaded Wikipedia pages");
        Ok(documents)
    }
}
