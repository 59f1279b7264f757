//! Sentence-aware chunking.
//!
//! Chunk size is measured in units, where a unit is one whitespace-delimited
//! token. Sentences are packed greedily into chunks of at most `chunk_size`
//! units; the last `chunk_overlap` units of a chunk are repeated at the start
//! of the next one. A sentence longer than a whole chunk is hard-split at the
//! unit boundary.

use tracing::debug;
use uuid::Uuid;

use crate::document::{Document, Node};
use crate::error::IndexError;

/// Splits documents into overlapping, sentence-aligned chunks.
#[derive(Debug, Clone, Copy)]
pub struct SentenceSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SentenceSplitter {
    /// Create a splitter. `chunk_overlap` must be smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, IndexError> {
        if chunk_size == 0 {
            return Err(IndexError::InvalidChunking(
                "chunk_size must be positive".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(IndexError::InvalidChunking(format!(
                "chunk_overlap {} must be smaller than chunk_size {}",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split every document, numbering chunks per document.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Node> {
        let mut nodes = Vec::new();
        for doc in documents {
            for (position, text) in self.split_text(&doc.text).into_iter().enumerate() {
                nodes.push(Node {
                    id: Uuid::new_v4(),
                    doc_id: doc.id.clone(),
                    position,
                    text,
                });
            }
        }
        debug!(
            documents = documents.len(),
            chunks = nodes.len(),
            chunk_size = self.chunk_size,
            "Documents split into chunks"
        );
        nodes
    }

    /// Split one text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut packer = ChunkPacker::new(self.chunk_size, self.chunk_overlap);

        for paragraph in text.split("\n\n") {
            for sentence in split_sentences(paragraph) {
                let units: Vec<&str> = sentence.split_whitespace().collect();
                if units.is_empty() {
                    continue;
                }
                if units.len() > self.chunk_size {
                    for unit in units {
                        packer.push_unit(unit);
                    }
                } else {
                    packer.push_sentence(&units);
                }
            }
        }

        packer.finish()
    }
}

/// Greedy accumulator behind [`SentenceSplitter::split_text`].
struct ChunkPacker<'a> {
    chunk_size: usize,
    chunk_overlap: usize,
    current: Vec<&'a str>,
    /// Units in `current` that were not carried over as overlap.
    fresh: usize,
    chunks: Vec<String>,
}

impl<'a> ChunkPacker<'a> {
    fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            current: Vec::new(),
            fresh: 0,
            chunks: Vec::new(),
        }
    }

    fn push_sentence(&mut self, units: &[&'a str]) {
        if self.current.len() + units.len() > self.chunk_size && self.fresh > 0 {
            self.flush();
        }
        // Overlap yields to a sentence that would not otherwise fit.
        let room = self.chunk_size - units.len();
        if self.current.len() > room {
            let excess = self.current.len() - room;
            self.current.drain(..excess);
        }
        self.current.extend_from_slice(units);
        self.fresh += units.len();
    }

    fn push_unit(&mut self, unit: &'a str) {
        if self.current.len() == self.chunk_size {
            self.flush();
        }
        self.current.push(unit);
        self.fresh += 1;
    }

    fn flush(&mut self) {
        self.chunks.push(self.current.join(" "));
        let keep_from = self.current.len().saturating_sub(self.chunk_overlap);
        self.current.drain(..keep_from);
        self.fresh = 0;
    }

    fn finish(mut self) -> Vec<String> {
        if self.fresh > 0 {
            self.flush();
        }
        self.chunks
    }
}

/// Split text at `.`, `!`, or `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    for (i, c) in text.char_indices() {
        if (c == '.' || c == '!' || c == '?') && i + 1 < text.len() {
            let next = bytes.get(i + 1).copied().unwrap_or(0);
            if next.is_ascii_whitespace() {
                result.push(&text[start..=i]);
                start = i + 1;
            }
        }
    }
    if start < text.len() {
        result.push(&text[start..]);
    }
    result
}

/// Number of units in `text`.
pub fn count_units(text: &str) -> usize {
    text.split_whitespace().count()
}
