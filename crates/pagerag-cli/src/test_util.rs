use pagerag_lib::db::store::persist_index;
use pagerag_lib::embedding::Embedder;
use pagerag_lib::pipeline::corpus::Chunk;
use pagerag_lib::pipeline::index::SimilarityIndex;
use pagerag_lib::runtime::Runtime;

// Re-export shared helpers from pagerag-test-util.
pub use pagerag_test_util::chat::ScriptedChat;
pub use pagerag_test_util::embedder::FakeEmbedder;
pub use pagerag_test_util::pages::write_pages_jsonl;
pub use pagerag_test_util::runtime::{FakeModels, runtime_in_memory, runtime_not_built};

/// Commit an index holding one chunk per `(source_path, page_index, text)`,
/// embedded with [`FakeEmbedder`].
///
/// Documents are numbered in first-seen order of their path.
pub fn seed_index(runtime: &Runtime, rows: &[(&str, usize, &str)]) {
    let mut paths: Vec<&str> = Vec::new();
    let chunks = rows
        .iter()
        .map(|(path, page, text)| {
            let document_index = paths.iter().position(|p| p == path).unwrap_or_else(|| {
                paths.push(path);
                paths.len() - 1
            });
            Chunk {
                source_path: (*path).to_string(),
                document_index,
                page_index: *page,
                chunk_text: (*text).to_string(),
            }
        })
        .collect();

    let mut embedder = FakeEmbedder::new();
    let index = SimilarityIndex::build(chunks, &mut embedder).unwrap();
    let mut conn = runtime.db.open().unwrap();
    persist_index(&mut conn, &index, embedder.model_id()).unwrap();
}
