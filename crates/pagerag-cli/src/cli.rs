use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use pagerag_lib::config::{
    DEFAULT_MAX_TOKENS, DEFAULT_OVERLAP, DEFAULT_THRESHOLD, DEFAULT_TOKENS_PER_CHUNK,
    DEFAULT_TOP_N, EmbedderKind,
};

#[derive(Parser, Debug)]
#[command(
    name = "pagerag",
    about = "Question answering over PDF page text with cited sources"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chunk, embed and index every page under a prefix, replacing the
    /// previous index.
    Build(BuildArgs),

    /// Print the context and citations retrieved for a question.
    Query {
        /// Question text.
        text: String,
        #[command(flatten)]
        retrieval: RetrievalArgs,
    },

    /// Interactive chat grounded in the indexed documents.
    ///
    /// `/reset` clears the conversation, `/exit` or end of input quits.
    Chat {
        #[command(flatten)]
        retrieval: RetrievalArgs,
    },

    /// Show what the current index was built from.
    Status,

    /// Manage the local embedding model.
    Model {
        #[command(subcommand)]
        model_command: ModelCommand,
    },
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// JSONL file of extracted pages (`source_path`, `page_index`, `raw_text`).
    pub pages: PathBuf,

    /// Only index documents whose path starts with this prefix.
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Longest page, in words, the chunk windows cover.
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: usize,

    /// Words per chunk.
    #[arg(long, default_value_t = DEFAULT_TOKENS_PER_CHUNK)]
    pub tokens_per_chunk: usize,

    /// Words shared by consecutive chunks.
    #[arg(long, default_value_t = DEFAULT_OVERLAP)]
    pub overlap: usize,

    /// Keep page text exactly as extracted instead of cleaning it.
    #[arg(long)]
    pub raw: bool,

    /// Embedding backend; defaults to `PAGERAG_EMBEDDER`.
    #[arg(long, value_parser = parse_embedder)]
    pub embedder: Option<EmbedderKind>,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct RetrievalArgs {
    /// Number of nearest chunks to consider.
    #[arg(short = 'n', long = "top-n", default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Minimum cosine similarity for a chunk to count as evidence.
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f32,

    /// Embedding backend; must match the one the index was built with.
    #[arg(long, value_parser = parse_embedder)]
    pub embedder: Option<EmbedderKind>,
}

#[derive(Subcommand, Debug)]
pub enum ModelCommand {
    /// Download the local embedding model files from Hugging Face.
    Download {
        /// Force re-download even if files already exist.
        #[arg(long)]
        force: bool,
    },
}

fn parse_embedder(value: &str) -> Result<EmbedderKind, String> {
    value.parse().map_err(|e: anyhow::Error| e.to_string())
}
