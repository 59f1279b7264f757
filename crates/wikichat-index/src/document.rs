//! Documents and the chunks (nodes) they are split into.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A loaded source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Source-specific identifier (the Wikipedia page id).
    pub id: String,
    pub title: String,
    /// Plain text body.
    pub text: String,
    pub metadata: serde_json::Value,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A chunk of a document, the unit both indexes are built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: Uuid,
    /// Id of the document this chunk came from.
    pub doc_id: String,
    /// Zero-based position of the chunk within its document.
    pub position: usize,
    pub text: String,
}

/// A node paired with its retrieval score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeWithScore {
    pub node: Node,
    pub score: f64,
}
