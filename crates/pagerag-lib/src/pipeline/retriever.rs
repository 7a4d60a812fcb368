use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::embedding::Embedder;
use crate::error::RagError;
use crate::pipeline::context::{ContextBundle, assemble};
use crate::pipeline::index::SimilarityIndex;

/// Serving handle over the current similarity index.
///
/// The index itself is never mutated; a rebuilt index replaces the old one
/// through [`Retriever::swap`], and in-flight queries keep the snapshot they
/// started with.
#[derive(Debug, Default)]
pub struct Retriever {
    current: RwLock<Option<Arc<SimilarityIndex>>>,
}

impl Retriever {
    /// A retriever with no index installed yet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_index(index: SimilarityIndex) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(index))),
        }
    }

    /// Install `index`, returning the one it replaced.
    pub fn swap(&self, index: SimilarityIndex) -> Option<Arc<SimilarityIndex>> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        guard.replace(Arc::new(index))
    }

    /// The installed index, or [`RagError::IndexNotBuilt`].
    pub fn snapshot(&self) -> Result<Arc<SimilarityIndex>, RagError> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(RagError::IndexNotBuilt)
    }

    /// Embed `query`, fetch the `top_n` nearest rows and assemble them into
    /// context and citations.
    ///
    /// Returns the `"null"` pair when nothing clears `threshold`. Fails with
    /// [`RagError::IndexNotBuilt`] before an index has been installed.
    pub fn answer_context(
        &self,
        embedder: &mut dyn Embedder,
        query: &str,
        top_n: usize,
        threshold: f32,
    ) -> Result<ContextBundle, RagError> {
        let index = self.snapshot()?;

        let query_embedding = embedder.embed(query).map_err(|e| RagError::embedding(&e))?;
        debug!(query_len = query.len(), "Query embedding created");

        let results = index.top_n(&query_embedding, top_n)?;
        Ok(assemble(&results, threshold))
    }
}
