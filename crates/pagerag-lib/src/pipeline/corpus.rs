use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pipeline::chunker::Chunker;

/// Text of one page of one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPage {
    /// Addressable key of the document (blob path or file path).
    pub source_path: String,
    /// Position of the document in the source listing.
    pub document_index: usize,
    /// Zero-based page number within the document.
    pub page_index: usize,
    pub raw_text: String,
}

/// A page together with the chunks the chunker produced for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedPage {
    pub page: DocumentPage,
    pub chunks: Vec<String>,
}

/// One chunk of page text with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub source_path: String,
    pub document_index: usize,
    pub page_index: usize,
    pub chunk_text: String,
}

/// Run the chunker over every page.
///
/// Pages are independent, so they are chunked in parallel; the output keeps
/// the input order.
pub fn chunk_pages(chunker: &Chunker, pages: Vec<DocumentPage>) -> Vec<ChunkedPage> {
    let chunked: Vec<ChunkedPage> = pages
        .into_par_iter()
        .map(|page| {
            let chunks = chunker.split(&page.raw_text);
            ChunkedPage { page, chunks }
        })
        .collect();

    debug!(
        page_count = chunked.len(),
        chunk_count = chunked.iter().map(|p| p.chunks.len()).sum::<usize>(),
        "Chunked pages"
    );

    chunked
}

/// Flatten chunked pages into one row per chunk.
///
/// Rows follow document order, then page order, then chunk order.
pub fn expand(pages: Vec<ChunkedPage>) -> Vec<Chunk> {
    let mut rows = Vec::with_capacity(pages.iter().map(|p| p.chunks.len()).sum());

    for ChunkedPage { page, chunks } in pages {
        for chunk_text in chunks {
            rows.push(Chunk {
                source_path: page.source_path.clone(),
                document_index: page.document_index,
                page_index: page.page_index,
                chunk_text,
            });
        }
    }

    rows
}
