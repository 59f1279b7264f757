use std::fmt;
use std::sync::Arc;

use crate::engine::QueryEngine;

/// A query engine with a name and a natural-language description.
///
/// The router selects tools by comparing the question with each
/// description, so the description should say what kind of question the
/// engine is good at.
#[derive(Clone)]
pub struct QueryEngineTool {
    pub name: String,
    pub description: String,
    pub engine: Arc<dyn QueryEngine>,
}

impl QueryEngineTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        engine: Arc<dyn QueryEngine>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            engine,
        }
    }

    /// Text embedded for tool selection.
    pub fn selection_text(&self) -> String {
        format!("{}: {}", self.name, self.description)
    }
}

impl fmt::Debug for QueryEngineTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEngineTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
