//! WikiChat index crate - document loading, chunking, embedding, indexing,
//! answer synthesis, and tool routing.
//!
//! The pipeline loads one Wikipedia article, splits it into chunks, builds a
//! summary index and a vector index over the chunks, wraps each as a
//! described query-engine tool, and combines both tools into a router that
//! picks the best-matching tool per question. [`IndexCache`] guarantees the
//! whole build runs at most once per process.

pub mod builder;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod index;
pub mod llm;
pub mod loader;
pub mod router;
pub mod splitter;
pub mod synthesizer;
pub mod tool;

pub use builder::{BuildSettings, IndexBuilder, IndexCache};
pub use document::{Document, Node, NodeWithScore};
pub use embedding::{DynEmbeddingService, EmbeddingService, MockEmbedding, OpenAiEmbedding};
pub use engine::{Answer, QueryEngine, Retriever, RetrieverQueryEngine, SummaryIndex, VectorStoreIndex};
pub use error::IndexError;
pub use index::{SearchHit, VectorIndex};
pub use llm::{LlmClient, OpenAiChat};
pub use loader::{DocumentSource, WikipediaReader};
pub use router::RouterQueryEngine;
pub use splitter::SentenceSplitter;
pub use synthesizer::TreeSummarize;
pub use tool::QueryEngineTool;
