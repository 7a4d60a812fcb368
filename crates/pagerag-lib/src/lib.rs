//! Retrieval core for answering questions over PDF page text: word-window
//! chunking, cosine-similarity retrieval, citation-safe context assembly and
//! the storage/collaborator plumbing around them.

pub mod chat;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod pipeline;
pub mod runtime;
pub mod source;

#[cfg(test)]
pub(crate) mod test_util;

pub use error::RagError;
