use std::collections::HashSet;

use anyhow::Context;
use rusqlite::Connection;
use tracing::info;

use crate::db::store::{IndexMeta, load_index, persist_index};
use crate::embedding::Embedder;
use crate::pipeline::chunker::Chunker;
use crate::pipeline::corpus::{chunk_pages, expand};
use crate::pipeline::index::SimilarityIndex;
use crate::pipeline::retriever::Retriever;
use crate::source::DocumentSource;

/// Counts reported after a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub documents: usize,
    pub pages: usize,
    pub chunks: usize,
    pub meta: IndexMeta,
}

/// A freshly built index along with what went into it.
#[derive(Debug)]
pub struct BuiltIndex {
    pub index: SimilarityIndex,
    pub summary: BuildSummary,
}

/// Rebuild the index from every page under `prefix` and commit it to `conn`.
///
/// Any failure leaves the previously committed index in place.
pub fn run_build(
    source: &dyn DocumentSource,
    prefix: &str,
    chunker: &Chunker,
    embedder: &mut dyn Embedder,
    conn: &mut Connection,
) -> anyhow::Result<BuiltIndex> {
    let pages = source.list_pages(prefix)?;
    let page_count = pages.len();
    let documents = pages
        .iter()
        .map(|p| p.source_path.as_str())
        .collect::<HashSet<_>>()
        .len();
    info!(
        documents,
        pages = page_count,
        prefix,
        tokens_per_chunk = chunker.tokens_per_chunk(),
        overlap = chunker.overlap(),
        max_tokens = chunker.max_tokens(),
        "Chunking pages"
    );

    let chunks = expand(chunk_pages(chunker, pages));
    let chunk_count = chunks.len();
    info!(chunks = chunk_count, model = embedder.model_id(), "Embedding chunks");

    let index = SimilarityIndex::build(chunks, embedder)?;
    let meta = persist_index(conn, &index, embedder.model_id())
        .context("Failed to persist the similarity index")?;

    Ok(BuiltIndex {
        index,
        summary: BuildSummary {
            documents,
            pages: page_count,
            chunks: chunk_count,
            meta,
        },
    })
}

/// Load the committed index into a serving [`Retriever`].
pub fn load_retriever(conn: &Connection) -> anyhow::Result<Retriever> {
    Ok(Retriever::with_index(load_index(conn)?))
}
