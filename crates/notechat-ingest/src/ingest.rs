//! Document preparation: bytes → text → chunks, before any embedding.

use sha2::{Digest, Sha256};
use tracing::info;

use crate::chunking::RecursiveChunker;
use crate::file::{self, FileType};
use notechat_core::{Error, Result, RetrievalSettings};
use notechat_store::Chunk;

/// An uploaded document reduced to indexable chunks.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub name: String,
    pub file_type: FileType,
    /// SHA-256 of the raw upload bytes, hex encoded.
    pub fingerprint: String,
    pub chunks: Vec<Chunk>,
}

/// Handles text extraction and chunking for uploads.
#[derive(Debug, Clone, Default)]
pub struct Ingester {
    chunker: RecursiveChunker,
}

impl Ingester {
    pub fn new(settings: &RetrievalSettings) -> Self {
        Self {
            chunker: RecursiveChunker::from_settings(settings),
        }
    }

    pub fn chunker(&self) -> &RecursiveChunker {
        &self.chunker
    }

    /// Extract and chunk an upload named `name`.
    ///
    /// The type comes from the file extension. A document without any
    /// extractable text fails with [`Error::NoContent`].
    pub fn prepare(&self, name: &str, bytes: &[u8]) -> Result<PreparedDocument> {
        let file_type = FileType::from_filename(name)?;
        let text = file::extract_text(bytes, file_type)?;
        let chunks = self.chunker.chunks(&text, name);
        if chunks.is_empty() {
            return Err(Error::NoContent);
        }

        info!(
            "Prepared {} ({}): {} chars in {} chunks",
            name,
            file_type,
            text.chars().count(),
            chunks.len()
        );

        Ok(PreparedDocument {
            name: name.to_string(),
            file_type,
            fingerprint: content_hash(bytes),
            chunks,
        })
    }
}

/// Compute SHA-256 content hash.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
