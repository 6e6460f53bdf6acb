//! NoteChat Store: in-memory cosine-similarity vector index over document chunks.

pub mod index;
pub mod types;

pub use index::VectorIndex;
pub use types::*;
