pub mod build;
pub mod chunker;
pub mod context;
pub mod corpus;
pub mod index;
pub mod retriever;
