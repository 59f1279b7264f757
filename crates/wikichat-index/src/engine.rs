//! Retrievers and query engines.
//!
//! Two retrieval strategies are built over the same chunks:
//!
//! - [`SummaryIndex`] returns every chunk, in document order, so the answer is
//!   synthesized from the whole article. Suited to overview questions.
//! - [`VectorStoreIndex`] embeds every chunk and returns the `top_k` chunks
//!   most similar to the question. Suited to specific facts.
//!
//! A [`RetrieverQueryEngine`] pairs a retriever with a [`TreeSummarize`]
//! synthesizer to turn a question into an [`Answer`].

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info};

use crate::document::{Node, NodeWithScore};
use crate::embedding::DynEmbeddingService;
use crate::error::IndexError;
use crate::index::VectorIndex;
use crate::synthesizer::TreeSummarize;

/// Concurrent embedding requests while building a vector index.
const EMBED_CONCURRENCY: usize = 4;

/// A synthesized answer plus provenance.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    /// Names of the tools that produced this answer, in selection order.
    pub tools: Vec<String>,
    pub sources: Vec<NodeWithScore>,
}

impl Answer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tools: Vec::new(),
            sources: Vec::new(),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Fetches the chunks relevant to a question.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, question: &str) -> Result<Vec<NodeWithScore>, IndexError>;
}

/// Answers a question end to end.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn query(&self, question: &str) -> Result<Answer, IndexError>;
}

/// Retriever over all chunks.
#[derive(Debug, Clone)]
pub struct SummaryIndex {
    nodes: Arc<Vec<Node>>,
}

impl SummaryIndex {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes: Arc::new(nodes),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[async_trait]
impl Retriever for SummaryIndex {
    async fn retrieve(&self, _question: &str) -> Result<Vec<NodeWithScore>, IndexError> {
        Ok(self
            .nodes
            .iter()
            .map(|node| NodeWithScore {
                node: node.clone(),
                score: 1.0,
            })
            .collect())
    }
}

/// Similarity retriever over embedded chunks.
#[derive(Clone)]
pub struct VectorStoreIndex {
    index: VectorIndex<Node>,
    embedder: Arc<dyn DynEmbeddingService>,
    top_k: usize,
}

impl fmt::Debug for VectorStoreIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorStoreIndex")
            .field("entries", &self.index.len())
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl VectorStoreIndex {
    /// Embed every node and store it.
    pub async fn build(
        nodes: Vec<Node>,
        embedder: Arc<dyn DynEmbeddingService>,
        top_k: usize,
    ) -> Result<Self, IndexError> {
        let started = Instant::now();
        let index = VectorIndex::new();

        let embedded: Vec<(Node, Vec<f32>)> = stream::iter(nodes)
            .map(|node| {
                let embedder = Arc::clone(&embedder);
                async move {
                    let embedding = embedder.embed_boxed(&node.text).await?;
                    Ok::<_, IndexError>((node, embedding))
                }
            })
            .buffered(EMBED_CONCURRENCY)
            .try_collect()
            .await?;

        for (node, embedding) in embedded {
            index.insert(node.id, embedding, node)?;
        }

        info!(
            chunks = index.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Vector index built"
        );

        Ok(Self {
            index,
            embedder,
            top_k: top_k.max(1),
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[async_trait]
impl Retriever for VectorStoreIndex {
    async fn retrieve(&self, question: &str) -> Result<Vec<NodeWithScore>, IndexError> {
        let query = self.embedder.embed_boxed(question).await?;
        let hits = self.index.search(&query, self.top_k)?;
        debug!(hits = hits.len(), top_k = self.top_k, "Vector retrieval");
        Ok(hits
            .into_iter()
            .map(|hit| NodeWithScore {
                node: hit.payload,
                score: hit.score,
            })
            .collect())
    }
}

/// Retrieve, then synthesize.
#[derive(Clone)]
pub struct RetrieverQueryEngine {
    retriever: Arc<dyn Retriever>,
    synthesizer: TreeSummarize,
}

impl RetrieverQueryEngine {
    pub fn new(retriever: Arc<dyn Retriever>, synthesizer: TreeSummarize) -> Self {
        Self {
            retriever,
            synthesizer,
        }
    }
}

#[async_trait]
impl QueryEngine for RetrieverQueryEngine {
    async fn query(&self, question: &str) -> Result<Answer, IndexError> {
        if question.trim().is_empty() {
            return Err(IndexError::EmptyQuestion);
        }
        let sources = self.retriever.retrieve(question).await?;
        let chunks = sources.iter().map(|s| s.node.text.clone()).collect();
        let text = self.synthesizer.synthesize(question, chunks).await?;
        Ok(Answer {
            text,
            tools: Vec::new(),
            sources,
        })
    }
}
