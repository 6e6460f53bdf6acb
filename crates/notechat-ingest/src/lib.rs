//! NoteChat Ingest: text extraction per format, recursive chunking, upload preparation.

pub mod chunking;
pub mod extract;
pub mod file;
pub mod ingest;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use chunking::{ChunkError, RecursiveChunker};
pub use file::{extract_path, extract_tagged, extract_text, FileType};
pub use ingest::{content_hash, Ingester, PreparedDocument};
