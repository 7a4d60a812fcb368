pub mod build;
pub mod chat;
pub mod model;
pub mod query;
pub mod status;

use anyhow::Context;
use tracing::warn;

use pagerag_lib::db::store::read_index_meta;
use pagerag_lib::embedding::Embedder;
use pagerag_lib::error::RagError;
use pagerag_lib::pipeline::build::load_retriever;
use pagerag_lib::pipeline::retriever::Retriever;
use pagerag_lib::runtime::Runtime;

/// Load the committed index, warning when `embedder` differs from the one it
/// was built with.
pub(crate) fn open_retriever(runtime: &Runtime, embedder: &dyn Embedder) -> anyhow::Result<Retriever> {
    if !runtime.db.is_ready() {
        return Err(RagError::IndexNotBuilt.into());
    }
    let conn = runtime.db.open()?;
    let meta = read_index_meta(&conn)
        .context("Failed to read index metadata")?
        .ok_or(RagError::IndexNotBuilt)?;
    if meta.embedder != embedder.model_id() {
        warn!(
            built_with = %meta.embedder,
            querying_with = embedder.model_id(),
            "Index was built with a different embedder; similarities may be meaningless"
        );
    }
    load_retriever(&conn)
}
