//! NoteChat Infer: embedding backends, batching, query cache.
//!
//! Provides the `EmbedderBackend` trait for generating embeddings and the
//! Cohere implementation used in production. Document texts are embedded in
//! fixed-size batches; questions go through an LRU query cache first.

pub mod cache;
pub mod cohere;
pub mod embedder;

pub use cache::{CacheStats, QueryCache};
pub use cohere::CohereEmbedder;
pub use embedder::{embed_documents, embed_query, EmbedMode, EmbedderBackend};

use std::sync::Arc;

use notechat_core::{NoteChatConfig, Result};

/// Create the configured embedder.
pub fn create_embedder(config: &NoteChatConfig) -> Result<Arc<dyn EmbedderBackend>> {
    let embedder = CohereEmbedder::new(&config.cohere, config.timeouts.connect)?;
    tracing::info!("Using Cohere embedder ({})", config.cohere.embed_model);
    Ok(Arc::new(embedder))
}
