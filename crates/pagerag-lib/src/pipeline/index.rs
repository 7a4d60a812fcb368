use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::EMBED_PROGRESS_EVERY;
use crate::embedding::Embedder;
use crate::error::RagError;
use crate::pipeline::corpus::Chunk;

/// A chunk together with its embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A row returned by [`SimilarityIndex::top_n`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub chunk: Chunk,
    /// Insertion position of the row within the index.
    pub position: usize,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub similarity: f32,
}

/// Cosine similarity of two vectors; `0.0` when either has zero norm.
///
/// Accumulates in `f64` so that `cosine_similarity(a, a)` is exactly `1.0`
/// for any non-zero `a`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    #[allow(clippy::cast_possible_truncation)]
    let similarity = (dot / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0) as f32;
    similarity
}

/// Immutable table of embedded chunks answering nearest-neighbour queries.
///
/// Rows keep insertion order and are never deduplicated. All embeddings have
/// the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimilarityIndex {
    rows: Vec<EmbeddedChunk>,
    dimension: usize,
}

impl SimilarityIndex {
    /// Embed every chunk in input order.
    ///
    /// Calls `embedder` exactly once per chunk. The first embedding failure
    /// aborts the build and nothing is returned.
    pub fn build(chunks: Vec<Chunk>, embedder: &mut dyn Embedder) -> Result<Self, RagError> {
        let total = chunks.len();
        info!(total, model = embedder.model_id(), "Generating embeddings");

        let mut rows = Vec::with_capacity(total);
        for (i, chunk) in chunks.into_iter().enumerate() {
            let embedding = embedder
                .embed(&chunk.chunk_text)
                .map_err(|e| RagError::embedding(&e))?;
            let done = i + 1;
            if done % EMBED_PROGRESS_EVERY == 0 {
                info!("{done}/{total}");
            }
            rows.push(EmbeddedChunk { chunk, embedding });
        }

        let index = Self::from_rows(rows)?;
        info!(
            rows = index.len(),
            dimension = index.dimension(),
            "Embeddings generated"
        );
        Ok(index)
    }

    /// Assemble an index from already-embedded rows, checking that every
    /// embedding has the same length.
    pub fn from_rows(rows: Vec<EmbeddedChunk>) -> Result<Self, RagError> {
        let dimension = rows.first().map_or(0, |r| r.embedding.len());
        if let Some(bad) = rows.iter().find(|r| r.embedding.len() != dimension) {
            return Err(RagError::DimensionMismatch {
                expected: dimension,
                actual: bad.embedding.len(),
            });
        }
        Ok(Self { rows, dimension })
    }

    pub fn rows(&self) -> &[EmbeddedChunk] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Embedding length shared by all rows (0 for an empty index).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The `n` rows most similar to `query`, best first.
    ///
    /// Equal scores keep insertion order. Returns every row when the index
    /// holds fewer than `n`.
    pub fn top_n(&self, query: &[f32], n: usize) -> Result<Vec<QueryResult>, RagError> {
        if self.rows.is_empty() || n == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .rows
            .par_iter()
            .enumerate()
            .map(|(i, row)| (i, cosine_similarity(query, &row.embedding)))
            .collect();
        // `sort_by` is stable, so ties stay in insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(n);

        let results: Vec<QueryResult> = scored
            .into_iter()
            .map(|(position, similarity)| QueryResult {
                chunk: self.rows[position].chunk.clone(),
                position,
                similarity,
            })
            .collect();

        debug!(
            n,
            returned = results.len(),
            best = results.first().map(|r| r.similarity),
            "Similarity search completed"
        );

        Ok(results)
    }
}
