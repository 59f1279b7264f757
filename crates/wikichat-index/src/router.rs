//! Tool-retriever router.
//!
//! Each tool's name and description are embedded once at build time. A
//! question is embedded and the `select_top_k` most similar tools answer it.
//! When more than one tool is selected their answers are combined with the
//! same tree-summarize synthesis used for chunks.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use wikichat_core::error::WikichatError;
use wikichat_core::AnswerRouter;

use crate::embedding::DynEmbeddingService;
use crate::engine::Answer;
use crate::error::IndexError;
use crate::index::VectorIndex;
use crate::synthesizer::TreeSummarize;
use crate::tool::QueryEngineTool;

/// Routes each question to the best-matching query-engine tool(s).
pub struct RouterQueryEngine {
    tools: Vec<QueryEngineTool>,
    tool_index: VectorIndex<usize>,
    embedder: Arc<dyn DynEmbeddingService>,
    select_top_k: usize,
    combiner: TreeSummarize,
}

impl std::fmt::Debug for RouterQueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterQueryEngine")
            .field("tools", &self.tool_names())
            .field("select_top_k", &self.select_top_k)
            .finish()
    }
}

impl RouterQueryEngine {
    /// Embed every tool description and build the router.
    pub async fn build(
        tools: Vec<QueryEngineTool>,
        embedder: Arc<dyn DynEmbeddingService>,
        select_top_k: usize,
        combiner: TreeSummarize,
    ) -> Result<Self, IndexError> {
        if tools.is_empty() {
            return Err(IndexError::NoToolSelected);
        }

        let tool_index = VectorIndex::new();
        for (i, tool) in tools.iter().enumerate() {
            let embedding = embedder.embed_boxed(&tool.selection_text()).await?;
            tool_index.insert(Uuid::new_v4(), embedding, i)?;
        }

        debug!(tools = tools.len(), select_top_k, "Router built");

        Ok(Self {
            tools,
            tool_index,
            embedder,
            select_top_k: select_top_k.max(1),
            combiner,
        })
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    /// The tools that would answer `question`, best match first.
    pub async fn select_tools(&self, question: &str) -> Result<Vec<&QueryEngineTool>, IndexError> {
        if question.trim().is_empty() {
            return Err(IndexError::EmptyQuestion);
        }
        let query = self.embedder.embed_boxed(question).await?;
        let hits = self.tool_index.search(&query, self.select_top_k)?;
        let selected: Vec<&QueryEngineTool> = hits
            .into_iter()
            .filter_map(|hit| self.tools.get(hit.payload))
            .collect();
        if selected.is_empty() {
            return Err(IndexError::NoToolSelected);
        }
        Ok(selected)
    }

    /// Answer with provenance.
    pub async fn query_answer(&self, question: &str) -> Result<Answer, IndexError> {
        let started = Instant::now();
        let selected = self.select_tools(question).await?;
        let names: Vec<String> = selected.iter().map(|t| t.name.clone()).collect();
        info!(tools = ?names, "Selected tool(s) for question");

        let mut answers =
            try_join_all(selected.iter().map(|tool| tool.engine.query(question))).await?;

        let answer = if answers.len() == 1 {
            let mut answer = answers.remove(0);
            answer.tools = names;
            answer
        } else {
            let partials = answers.iter().map(|a| a.text.clone()).collect();
            let text = self.combiner.synthesize(question, partials).await?;
            Answer {
                text,
                tools: names,
                sources: answers.into_iter().flat_map(|a| a.sources).collect(),
            }
        };

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            sources = answer.sources.len(),
            "Question answered"
        );
        Ok(answer)
    }
}

#[async_trait]
impl AnswerRouter for RouterQueryEngine {
    async fn query(&self, question: &str) -> wikichat_core::Result<String> {
        self.query_answer(question)
            .await
            .map(|answer| answer.text)
            .map_err(|e| {
                warn!(error = %e, "Router failed to answer");
                WikichatError::Answer(e.to_string())
            })
    }
}
