//! Domain errors raised by the retrieval core.

use thiserror::Error;

/// Errors that callers need to tell apart.
///
/// Orchestration code wraps these in `anyhow::Error`; use
/// `err.downcast_ref::<RagError>()` to recover the variant.
#[derive(Debug, Error, PartialEq)]
pub enum RagError {
    #[error("invalid chunking parameters: {reason}")]
    InvalidChunkConfig { reason: String },

    #[error("the similarity index has not been built yet. Run `pagerag build` first.")]
    IndexNotBuilt,

    #[error("embedding dimension mismatch: index holds {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("document source failed: {0}")]
    Storage(String),

    #[error("embedding request failed: {0}")]
    Embedding(String),

    #[error("chat completion failed: {0}")]
    Chat(String),
}

impl RagError {
    /// Wrap a document source failure, keeping the full context chain.
    pub fn storage(err: &anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }

    /// Wrap an embedder failure, keeping the full context chain.
    pub fn embedding(err: &anyhow::Error) -> Self {
        Self::Embedding(format!("{err:#}"))
    }

    /// Wrap a chat model failure, keeping the full context chain.
    pub fn chat(err: &anyhow::Error) -> Self {
        Self::Chat(format!("{err:#}"))
    }
}
