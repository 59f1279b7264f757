//! Index construction and the process-wide memoized index.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use wikichat_core::WikichatConfig;

use crate::embedding::DynEmbeddingService;
use crate::engine::{RetrieverQueryEngine, SummaryIndex, VectorStoreIndex};
use crate::error::IndexError;
use crate::llm::LlmClient;
use crate::loader::DocumentSource;
use crate::router::RouterQueryEngine;
use crate::splitter::SentenceSplitter;
use crate::synthesizer::TreeSummarize;
use crate::tool::QueryEngineTool;

pub const SUMMARY_TOOL_NAME: &str = "summary_tool";
pub const VECTOR_TOOL_NAME: &str = "vector_tool";

/// Everything the builder needs from configuration.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub page_title: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub similarity_top_k: usize,
    pub select_top_k: usize,
    pub context_window_units: usize,
    pub summary_tool_description: String,
    pub vector_tool_description: String,
}

impl BuildSettings {
    pub fn from_config(config: &WikichatConfig) -> Self {
        Self {
            page_title: config.corpus.page_title.clone(),
            chunk_size: config.corpus.chunk_size,
            chunk_overlap: config.corpus.chunk_overlap,
            similarity_top_k: config.retrieval.similarity_top_k,
            select_top_k: config.retrieval.select_top_k,
            context_window_units: config.llm.context_window_units,
            summary_tool_description: config.retrieval.summary_tool_description.clone(),
            vector_tool_description: config.retrieval.vector_tool_description.clone(),
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self::from_config(&WikichatConfig::default())
    }
}

/// Loads the page and assembles the routed query engine.
#[derive(Clone)]
pub struct IndexBuilder {
    source: Arc<dyn DocumentSource>,
    embedder: Arc<dyn DynEmbeddingService>,
    llm: Arc<dyn LlmClient>,
    settings: BuildSettings,
}

impl IndexBuilder {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn DynEmbeddingService>,
        llm: Arc<dyn LlmClient>,
        settings: BuildSettings,
    ) -> Self {
        Self {
            source,
            embedder,
            llm,
            settings,
        }
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Run the full pipeline: load, chunk, index, wrap as tools, route.
    pub async fn build(&self) -> Result<RouterQueryEngine, IndexError> {
        let started = Instant::now();
        let title = &self.settings.page_title;
        info!(page = %title, "Building index");

        let documents = self.source.load(std::slice::from_ref(title)).await?;
        if documents.iter().all(|d| d.is_blank()) {
            return Err(IndexError::EmptyCorpus(title.clone()));
        }

        let splitter = SentenceSplitter::new(self.settings.chunk_size, self.settings.chunk_overlap)?;
        let nodes = splitter.split_documents(&documents);
        if nodes.is_empty() {
            return Err(IndexError::EmptyCorpus(title.clone()));
        }

        let synthesizer = TreeSummarize::new(Arc::clone(&self.llm), self.settings.context_window_units);

        let summary_index = SummaryIndex::new(nodes.clone());
        let vector_index = VectorStoreIndex::build(
            nodes,
            Arc::clone(&self.embedder),
            self.settings.similarity_top_k,
        )
        .await?;

        let tools = vec![
            QueryEngineTool::new(
                SUMMARY_TOOL_NAME,
                self.settings.summary_tool_description.clone(),
                Arc::new(RetrieverQueryEngine::new(
                    Arc::new(summary_index),
                    synthesizer.clone(),
                )),
            ),
            QueryEngineTool::new(
                VECTOR_TOOL_NAME,
                self.settings.vector_tool_description.clone(),
                Arc::new(RetrieverQueryEngine::new(
                    Arc::new(vector_index),
                    synthesizer.clone(),
                )),
            ),
        ];

        let router = RouterQueryEngine::build(
            tools,
            Arc::clone(&self.embedder),
            self.settings.select_top_k,
            synthesizer,
        )
        .await?;

        info!(
            page = %title,
            documents = documents.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Index ready"
        );
        Ok(router)
    }
}

/// Builds the index at most once per process and hands out shared handles.
///
/// Concurrent callers of [`IndexCache::ensure_index`] wait on the same build.
/// A failed build is not cached; the next call tries again.
pub struct IndexCache {
    builder: IndexBuilder,
    cell: OnceCell<Arc<RouterQueryEngine>>,
    builds: AtomicUsize,
}

impl IndexCache {
    pub fn new(builder: IndexBuilder) -> Self {
        Self {
            builder,
            cell: OnceCell::new(),
            builds: AtomicUsize::new(0),
        }
    }

    /// Return the index, building it on first use.
    pub async fn ensure_index(&self) -> Result<Arc<RouterQueryEngine>, IndexError> {
        self.cell
            .get_or_try_init(|| async {
                self.builds.fetch_add(1, Ordering::SeqCst);
                match self.builder.build().await {
                    Ok(router) => Ok(Arc::new(router)),
                    Err(e) => {
                        warn!(error = %e, "Index build failed");
                        Err(e)
                    }
                }
            })
            .await
            .map(Arc::clone)
    }

    /// Number of build attempts so far.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::embedding::MockEmbedding;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;

    const PAGE_TEXT: &str = "Snowflake Inc. is an American cloud computing based data cloud company. \
        It was founded in July 2012.\n\n\
        Snowflake went public on September 16, 2020. \
        In March 2022 Snowflake acquired Streamlit for 800 million dollars.";

    struct CountingSource {
        loads: AtomicUsize,
        text: &'static str,
        fail_first: AtomicBool,
    }

    impl CountingSource {
        fn new(text: &'static str) -> Arc<Self> {
            Arc::new(Self {
                loads: AtomicUsize::new(0),
                text,
                fail_first: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl DocumentSource for CountingSource {
        async fn load(&self, pages: &[String]) -> Result<Vec<Document>, IndexError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_first.swap(false, Ordering::SeqCst) {
                return Err(IndexError::DocumentSource("connection reset".to_string()));
            }
            Ok(pages
                .iter()
                .map(|title| Document::new("42", title.clone(), self.text))
                .collect())
        }
    }

    struct ContextLlm;

    #[async_trait]
    impl LlmClient for ContextLlm {
        async fn complete(&self, prompt: &str) -> Result<String, IndexError> {
            let context = prompt
                .split("---------------------")
                .nth(1)
                .unwrap_or_default()
                .trim()
                .to_string();
            Ok(context)
        }
    }

    fn builder(source: Arc<CountingSource>) -> IndexBuilder {
        IndexBuilder::new(
            source,
            Arc::new(MockEmbedding::new()),
            Arc::new(ContextLlm),
            BuildSettings {
                chunk_size: 16,
                chunk_overlap: 2,
                ..BuildSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn test_build_creates_both_tools() {
        let router = builder(CountingSource::new(PAGE_TEXT)).build().await.unwrap();
        assert_eq!(router.tool_names(), vec![SUMMARY_TOOL_NAME, VECTOR_TOOL_NAME]);
    }

    #[tokio::test]
    async fn test_summary_question_uses_whole_page() {
        let router = builder(CountingSource::new(PAGE_TEXT)).build().await.unwrap();
        let answer = router
            .query_answer("Summarize Snowflake's Wikipedia page for me")
            .await
            .unwrap();
        assert_eq!(answer.tools, vec![SUMMARY_TOOL_NAME.to_string()]);
        assert!(answer.text.contains("founded in July 2012"));
        assert!(answer.text.contains("Streamlit"));
    }

    #[tokio::test]
    async fn test_specific_question_uses_top_chunks() {
        let router = builder(CountingSource::new(PAGE_TEXT)).build().await.unwrap();
        let answer = router
            .query_answer("Retrieving specific information: when did Snowflake acquire Streamlit?")
            .await
            .unwrap();
        assert_eq!(answer.tools, vec![VECTOR_TOOL_NAME.to_string()]);
        assert!(answer.sources.len() <= 2);
        assert!(answer.text.contains("Streamlit"));
    }

    #[tokio::test]
    async fn test_blank_page_is_empty_corpus() {
        let err = builder(CountingSource::new("  \n\n ")).build().await.unwrap_err();
        assert!(matches!(err, IndexError::EmptyCorpus(_)));
    }

    #[tokio::test]
    async fn test_cache_builds_once() {
        let source = CountingSource::new(PAGE_TEXT);
        let cache = Arc::new(IndexCache::new(builder(source.clone())));
        assert!(!cache.is_ready());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.ensure_index().await.map(|_| ()) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let first = cache.ensure_index().await.unwrap();
        let second = cache.ensure_index().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.build_count(), 1);
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert!(cache.is_ready());
    }

    #[tokio::test]
    async fn test_cache_retries_after_failure() {
        let source = CountingSource::new(PAGE_TEXT);
        source.fail_first.store(true, Ordering::SeqCst);
        let cache = IndexCache::new(builder(source.clone()));

        assert!(cache.ensure_index().await.is_err());
        assert!(!cache.is_ready());
        assert!(cache.ensure_index().await.is_ok());
        assert_eq!(cache.build_count(), 2);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = WikichatConfig::default();
        config.corpus.page_title = "Streamlit".to_string();
        config.retrieval.similarity_top_k = 5;
        let settings = BuildSettings::from_config(&config);
        assert_eq!(settings.page_title, "Streamlit");
        assert_eq!(settings.similarity_top_k, 5);
        assert_eq!(settings.chunk_size, 1024);
        assert_eq!(settings.chunk_overlap, 20);
    }
}
