use std::io::Write;

use pagerag_lib::pipeline::build::run_build;
use pagerag_lib::pipeline::chunker::Chunker;
use pagerag_lib::runtime::Runtime;
use pagerag_lib::source::jsonl::JsonlPageSource;

use crate::cli::BuildArgs;
use crate::console::Console;

/// Run the `pagerag build` command.
pub fn run_build_cmd(
    args: &BuildArgs,
    runtime: &Runtime,
    console: &mut dyn Console,
) -> anyhow::Result<()> {
    let chunker = Chunker::new(args.max_tokens, args.tokens_per_chunk, args.overlap)?;

    let mut source = JsonlPageSource::new(&args.pages);
    if args.raw {
        source = source.raw();
    }

    let mut embedder = runtime.embedder(args.embedder)?;
    let mut conn = runtime.db.open()?;

    writeln!(
        console.err(),
        "Indexing {} (prefix {:?}, {} words per chunk, overlap {}, up to {} words per page)...",
        args.pages.display(),
        args.prefix,
        chunker.tokens_per_chunk(),
        chunker.overlap(),
        chunker.max_tokens()
    )?;
    let built = run_build(&source, &args.prefix, &chunker, &mut embedder, &mut conn)?;
    let summary = built.summary;

    if summary.pages == 0 {
        writeln!(
            console.out(),
            "No pages matched prefix {:?}; the index is now empty.",
            args.prefix
        )?;
        return Ok(());
    }
    if summary.chunks == 0 {
        writeln!(
            console.out(),
            "{} pages matched prefix {:?} but produced no chunks; the index is now empty.",
            summary.pages,
            args.prefix
        )?;
        return Ok(());
    }

    writeln!(
        console.out(),
        "Indexed {} chunks from {} pages in {} documents (dimension {}, embedder {}).",
        summary.chunks,
        summary.pages,
        summary.documents,
        summary.meta.dimension,
        summary.meta.embedder
    )?;
    Ok(())
}
