use std::io::Write;

use pagerag_lib::db::store::read_index_meta;
use pagerag_lib::embedding::local::LocalEmbedder;
use pagerag_lib::runtime::Runtime;

use crate::console::Console;

/// Run the `pagerag status` command.
pub fn run_status(runtime: &Runtime, console: &mut dyn Console) -> anyhow::Result<()> {
    let location = runtime
        .db
        .path()
        .map_or_else(|| "in-memory".to_string(), |p| p.display().to_string());
    let model = if LocalEmbedder::is_downloaded(&runtime.settings.model_cache_dir()) {
        "downloaded"
    } else {
        "not downloaded"
    };

    let meta = if runtime.db.is_ready() {
        read_index_meta(&runtime.db.open()?)?
    } else {
        None
    };

    let out = console.out();
    writeln!(out, "Index: {location}")?;
    match meta {
        Some(meta) => {
            writeln!(out, "Chunks: {}", meta.row_count)?;
            writeln!(out, "Dimension: {}", meta.dimension)?;
            writeln!(out, "Embedder: {}", meta.embedder)?;
            writeln!(out, "Built at: {}", meta.built_at)?;
        }
        None => writeln!(out, "Not built. Run `pagerag build <pages.jsonl>` first.")?,
    }
    writeln!(out, "Local model: {model}")?;
    Ok(())
}
