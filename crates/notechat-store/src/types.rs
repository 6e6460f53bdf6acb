//! Data types for chunks, search hits and index statistics.

use serde::{Deserialize, Serialize};

/// A contiguous piece of extracted document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position within the source document's chunk sequence.
    pub index: usize,
    pub text: String,
    /// Name of the document the chunk came from.
    pub source: String,
}

impl Chunk {
    pub fn new(index: usize, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            source: source.into(),
        }
    }
}

/// One search result: the chunk and its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Index-level statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
}
