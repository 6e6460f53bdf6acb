//! Embedding backend trait and batching helpers.
//!
//! The `EmbedderBackend` trait abstracts over embedding generation so the
//! pipeline can run against the hosted service or a test double.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::QueryCache;
use notechat_core::{Error, Result};

/// Which side of retrieval a text is embedded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    Document,
    Query,
}

impl EmbedMode {
    /// Cohere `input_type` value.
    pub fn input_type(&self) -> &'static str {
        match self {
            Self::Document => "search_document",
            Self::Query => "search_query",
        }
    }
}

/// Trait for embedding backends.
#[async_trait]
pub trait EmbedderBackend: Send + Sync {
    /// Embed `texts`, one vector per input, in input order.
    async fn embed(&self, texts: &[String], mode: EmbedMode) -> Result<Vec<Vec<f32>>>;

    /// Model identifier, for logs and status output.
    fn model(&self) -> &str;
}

/// Embed document chunks in batches of `batch_size`.
///
/// Batches run sequentially and are not retried; the first failing batch
/// aborts the whole call, so the caller either gets every vector or none.
pub async fn embed_documents(
    embedder: &dyn EmbedderBackend,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let batch_size = batch_size.max(1);
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());

    for (n, batch) in texts.chunks(batch_size).enumerate() {
        debug!("Embedding batch {} ({} texts)", n + 1, batch.len());
        let embedded = embedder.embed(batch, EmbedMode::Document).await?;
        let expected_dim = vectors.first().map(Vec::len);
        check_vectors(batch.len(), expected_dim, &embedded)?;
        vectors.extend(embedded);
    }

    info!(
        "Embedded {} chunks with {} ({} dims)",
        vectors.len(),
        embedder.model(),
        vectors.first().map(Vec::len).unwrap_or(0)
    );
    Ok(vectors)
}

/// Embed a question, going through `cache` first.
pub async fn embed_query(
    embedder: &dyn EmbedderBackend,
    cache: &QueryCache,
    question: &str,
) -> Result<Vec<f32>> {
    if let Some(hit) = cache.get(question) {
        debug!("Query embedding served from cache");
        return Ok(hit);
    }

    let embedded = embedder
        .embed(&[question.to_string()], EmbedMode::Query)
        .await?;
    check_vectors(1, None, &embedded)?;
    let vector = embedded.into_iter().next().unwrap_or_default();
    cache.put(question, vector.clone());
    Ok(vector)
}

/// A response must hold one non-empty vector per input, all of one dimension.
fn check_vectors(expected: usize, dim: Option<usize>, vectors: &[Vec<f32>]) -> Result<()> {
    if vectors.len() != expected {
        return Err(Error::EmbeddingService(format!(
            "expected {} embeddings, got {}",
            expected,
            vectors.len()
        )));
    }
    let Some(dim) = dim.or_else(|| vectors.first().map(Vec::len)) else {
        return Ok(());
    };
    if dim == 0 {
        return Err(Error::EmbeddingService("received empty embedding".into()));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        return Err(Error::EmbeddingService(format!(
            "inconsistent embedding dimensions: {} and {}",
            dim,
            bad.len()
        )));
    }
    Ok(())
}
