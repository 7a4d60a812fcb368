use std::io::Write;

use pagerag_lib::runtime::Runtime;

use crate::cli::RetrievalArgs;
use crate::commands::open_retriever;
use crate::console::Console;

/// Run the `pagerag query` command.
pub fn run_query(
    text: &str,
    retrieval: RetrievalArgs,
    runtime: &Runtime,
    console: &mut dyn Console,
) -> anyhow::Result<()> {
    let mut embedder = runtime.embedder(retrieval.embedder)?;
    let retriever = open_retriever(runtime, &*embedder)?;

    let bundle =
        retriever.answer_context(&mut embedder, text, retrieval.top_n, retrieval.threshold)?;

    if bundle.has_evidence() {
        writeln!(
            console.out(),
            "{}\n\nReferences:\n{}",
            bundle.context,
            bundle.citations
        )?;
    } else {
        writeln!(
            console.out(),
            "No passage reached similarity {}.",
            retrieval.threshold
        )?;
    }

    Ok(())
}
