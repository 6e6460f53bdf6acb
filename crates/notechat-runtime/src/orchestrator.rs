//! Orchestrator: coordinates upload indexing and question answering.

use std::sync::Arc;

use tracing::{debug, info};

use notechat_chat::{complete, prompt, ChatContext, CompletionBackend, Verbosity};
use notechat_core::{with_deadline, Error, Result, RetrievalSettings, Timeouts};
use notechat_infer::{embed_documents, embed_query, CacheStats, EmbedderBackend, QueryCache};
use notechat_ingest::{Ingester, PreparedDocument};
use notechat_store::VectorIndex;

use crate::types::*;

/// Runs the document pipeline against a pair of remote backends.
pub struct Orchestrator {
    ingester: Ingester,
    embedder: Arc<dyn EmbedderBackend>,
    completer: Arc<dyn CompletionBackend>,
    query_cache: Arc<QueryCache>,
    retrieval: RetrievalSettings,
    timeouts: Timeouts,
}

impl Orchestrator {
    pub fn new(
        embedder: Arc<dyn EmbedderBackend>,
        completer: Arc<dyn CompletionBackend>,
        retrieval: RetrievalSettings,
        timeouts: Timeouts,
    ) -> Self {
        info!(
            "Orchestrator initialized: embed={}, generate={}, chunk={}/{}, top_k={}",
            embedder.model(),
            completer.model(),
            retrieval.chunk_size,
            retrieval.chunk_overlap,
            retrieval.top_k
        );
        Self {
            ingester: Ingester::new(&retrieval),
            embedder,
            completer,
            query_cache: Arc::new(QueryCache::default()),
            retrieval,
            timeouts,
        }
    }

    pub fn retrieval(&self) -> &RetrievalSettings {
        &self.retrieval
    }

    pub fn embed_model(&self) -> &str {
        self.embedder.model()
    }

    pub fn generate_model(&self) -> &str {
        self.completer.model()
    }

    pub fn query_cache_stats(&self) -> CacheStats {
        self.query_cache.stats()
    }

    /// Extract and chunk an upload without touching the network.
    pub async fn prepare(&self, name: &str, bytes: Vec<u8>) -> Result<PreparedDocument> {
        let ingester = self.ingester.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || ingester.prepare(&name, &bytes))
            .await
            .map_err(|e| Error::Internal(format!("extraction task failed: {}", e)))?
    }

    /// Embed a prepared document and build its index.
    ///
    /// Every batch must succeed; on any failure nothing is returned and the
    /// caller's current index stays in place.
    pub async fn build_index(&self, doc: PreparedDocument) -> Result<IndexedDocument> {
        let texts: Vec<String> = doc.chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_documents(
            self.embedder.as_ref(),
            &texts,
            self.retrieval.embed_batch_size,
        )
        .await?;
        let index = VectorIndex::build(doc.chunks, vectors)?;

        info!(
            "Indexed {} ({} entries, dim {:?})",
            doc.name,
            index.len(),
            index.dimension()
        );
        Ok(IndexedDocument {
            name: doc.name,
            file_type: doc.file_type,
            fingerprint: doc.fingerprint,
            index: Arc::new(index),
        })
    }

    /// Upload verb: bytes → text → chunks → embeddings → index.
    pub async fn index_upload(&self, name: &str, bytes: Vec<u8>) -> Result<IndexedDocument> {
        let prepared = self.prepare(name, bytes).await?;
        self.build_index(prepared).await
    }

    /// Ask verb: retrieve the top chunks for `question` and generate an answer.
    pub async fn answer(
        &self,
        index: Arc<VectorIndex>,
        question: &str,
        verbosity: Verbosity,
    ) -> Result<AnswerWithSources> {
        let embedder = Arc::clone(&self.embedder);
        let cache = Arc::clone(&self.query_cache);
        let q = question.to_string();
        let query_vector = with_deadline(self.timeouts.connect, async move {
            embed_query(embedder.as_ref(), &cache, &q).await
        })
        .await?;

        let hits = index.search(&query_vector, self.retrieval.top_k)?;
        debug!(
            "Retrieved {} chunks (best score {:?})",
            hits.len(),
            hits.first().map(|h| h.score)
        );

        let context: Vec<_> = hits.iter().map(|h| h.chunk.clone()).collect();
        let rendered = prompt::render(question, &context, verbosity);

        let completer = Arc::clone(&self.completer);
        let answer = with_deadline(self.timeouts.generation, async move {
            complete(completer.as_ref(), &rendered).await
        })
        .await?;

        Ok(AnswerWithSources {
            answer,
            sources: hits
                .iter()
                .map(|h| ChatContext::from_hit(&h.chunk, h.score))
                .collect(),
        })
    }
}
