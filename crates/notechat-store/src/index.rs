//! In-memory vector index with cosine-similarity search.
//!
//! Embeddings are stored as L2-normalised rows of one `(N, dim)` matrix, so a
//! search is a single matrix-vector product. The dimension is fixed by the
//! first insertion.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde_json::json;
use tracing::debug;

use crate::types::{Chunk, IndexStats, SearchHit};
use notechat_core::{Error, Result};

/// Vector index over document chunks.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    /// Normalised embeddings, shape (N, dim).
    matrix: Array2<f32>,
    chunks: Vec<Chunk>,
    /// Per-entry metadata, aligned with `chunks`.
    metadata: Vec<serde_json::Value>,
    dimension: Option<usize>,
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorIndex {
    pub fn new() -> Self {
        Self {
            matrix: Array2::zeros((0, 0)),
            chunks: Vec::new(),
            metadata: Vec::new(),
            dimension: None,
        }
    }

    /// Build an index from chunks and their embeddings, paired by position.
    ///
    /// Fails with [`Error::DimensionMismatch`] when the counts differ or the
    /// embeddings disagree on dimension; no index is produced in that case.
    pub fn build(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        let mut index = Self::new();
        index.add(chunks, embeddings)?;
        Ok(index)
    }

    /// Append entries. Everything is validated before the first entry is
    /// written, so a failed call leaves the index unchanged.
    pub fn add(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::DimensionMismatch {
                expected: chunks.len(),
                actual: embeddings.len(),
            });
        }
        let Some(first) = embeddings.first() else {
            return Ok(());
        };

        let dim = self.dimension.unwrap_or(first.len());
        if dim == 0 {
            return Err(Error::InvalidInput("embeddings must not be empty".into()));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }

        let mut rows = Array2::zeros((embeddings.len(), dim));
        for (mut row, embedding) in rows.rows_mut().into_iter().zip(&embeddings) {
            row.assign(&normalized(ArrayView1::from(embedding.as_slice())));
        }

        self.matrix = if self.dimension.is_some() {
            ndarray::concatenate(Axis(0), &[self.matrix.view(), rows.view()])
                .map_err(|e| Error::Internal(format!("index append failed: {}", e)))?
        } else {
            rows
        };
        self.dimension = Some(dim);
        for chunk in chunks {
            self.metadata.push(json!({
                "source": chunk.source,
                "chunk_index": chunk.index,
            }));
            self.chunks.push(chunk);
        }

        debug!("Index now holds {} entries of dimension {}", self.chunks.len(), dim);
        Ok(())
    }

    /// Top `k` entries by decreasing cosine similarity to `query`.
    ///
    /// Returns `min(k, len)` hits; equal scores keep insertion order. An empty
    /// index yields no hits regardless of the query.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let Some(dim) = self.dimension else {
            return Ok(Vec::new());
        };
        if query.len() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: query.len(),
            });
        }

        let q = normalized(ArrayView1::from(query));
        let similarities = self.matrix.dot(&q);

        let mut ranked: Vec<(usize, f32)> = similarities.iter().copied().enumerate().collect();
        // Stable sort: ties stay in insertion order.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);

        Ok(ranked
            .into_iter()
            .map(|(i, score)| SearchHit {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn metadata(&self, position: usize) -> Option<&serde_json::Value> {
        self.metadata.get(position)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entries: self.len(),
            dimension: self.dimension,
        }
    }
}

/// Unit-length copy of `v`; zero vectors stay zero.
fn normalized(v: ArrayView1<'_, f32>) -> Array1<f32> {
    let norm = v.dot(&v).sqrt();
    if norm > 1e-9 {
        &v / norm
    } else {
        v.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n).map(|i| Chunk::new(i, format!("chunk {}", i), "doc")).collect()
    }

    #[test]
    fn test_build_and_search() {
        let index = VectorIndex::build(
            chunks(3),
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
        )
        .unwrap();
        assert_eq!(index.len(), 3);

        let hits = index.search(&[1.0, 0.1], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "chunk 0");
        assert_eq!(hits[1].chunk.text, "chunk 2");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_scores_ignore_magnitude() {
        let index = VectorIndex::build(chunks(1), vec![vec![10.0, 0.0]]).unwrap();
        let hits = index.search(&[0.5, 0.0], 1).unwrap();
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_k_larger_than_len() {
        let index = VectorIndex::build(chunks(2), vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(index.search(&[1.0, 1.0], 10).unwrap().len(), 2);
        assert!(index.search(&[1.0, 1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = VectorIndex::build(chunks(4), vec![vec![1.0, 0.0]; 4]).unwrap();
        let order: Vec<usize> = index
            .search(&[1.0, 0.0], 4)
            .unwrap()
            .iter()
            .map(|h| h.chunk.index)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_count_mismatch_builds_nothing() {
        let err = VectorIndex::build(chunks(3), vec![vec![1.0]; 2]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn test_failed_add_leaves_index_unchanged() {
        let mut index = VectorIndex::build(chunks(2), vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let err = index
            .add(chunks(2), vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]])
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 3 }));
        assert_eq!(index.len(), 2);

        index.add(chunks(1), vec![vec![0.0, 2.0]]).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.stats(), IndexStats { entries: 3, dimension: Some(2) });
    }

    #[test]
    fn test_empty_index_search() {
        let index = VectorIndex::new();
        assert!(index.search(&[1.0, 2.0, 3.0], 5).unwrap().is_empty());
        assert!(index.search(&[], 5).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_query_dimension() {
        let index = VectorIndex::build(chunks(1), vec![vec![1.0, 0.0]]).unwrap();
        let err = index.search(&[1.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_metadata_follows_entries() {
        let index = VectorIndex::build(vec![Chunk::new(7, "x", "a.pdf")], vec![vec![1.0]]).unwrap();
        let meta = index.metadata(0).unwrap();
        assert_eq!(meta["source"], "a.pdf");
        assert_eq!(meta["chunk_index"], 7);
        assert!(index.metadata(1).is_none());
    }

    const DIM: usize = 8;

    fn arb_embedding() -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(-1.0f32..1.0f32, DIM)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_search_bounded_and_descending(
            embeddings in prop::collection::vec(arb_embedding(), 0..30),
            query in arb_embedding(),
            k in 0usize..40,
        ) {
            let n = embeddings.len();
            let index = VectorIndex::build(chunks(n), embeddings).unwrap();
            let hits = index.search(&query, k).unwrap();

            prop_assert_eq!(hits.len(), k.min(n));
            for pair in hits.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }

        #[test]
        fn prop_mismatched_lengths_rejected(n in 0usize..10, m in 0usize..10) {
            prop_assume!(n != m);
            let result = VectorIndex::build(chunks(n), vec![vec![1.0; DIM]; m]);
            let is_mismatch = matches!(result, Err(Error::DimensionMismatch { .. }));
            prop_assert!(is_mismatch);
        }
    }
}
