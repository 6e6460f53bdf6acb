//! Runtime types.

use std::sync::Arc;

use serde::Serialize;

use notechat_chat::{Answer, ChatContext};
use notechat_ingest::FileType;
use notechat_store::VectorIndex;

/// A document whose chunks have been embedded into a ready index.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub name: String,
    pub file_type: FileType,
    pub fingerprint: String,
    pub index: Arc<VectorIndex>,
}

impl IndexedDocument {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            name: self.name.clone(),
            file_type: self.file_type,
            fingerprint: self.fingerprint.clone(),
            chunks: self.index.len(),
            dimension: self.index.dimension(),
        }
    }
}

/// Public view of the active document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub fingerprint: String,
    pub chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
}

/// An answer and the chunks it was grounded on, in retrieval order.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerWithSources {
    #[serde(flatten)]
    pub answer: Answer,
    pub sources: Vec<ChatContext>,
}
