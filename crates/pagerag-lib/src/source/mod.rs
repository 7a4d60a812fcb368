pub mod clean;
pub mod jsonl;

use crate::error::RagError;
use crate::pipeline::corpus::DocumentPage;

/// Lists the pages of every document under a path prefix.
///
/// Connectivity, authentication and extraction failures surface as
/// [`RagError::Storage`].
pub trait DocumentSource {
    fn list_pages(&self, prefix: &str) -> Result<Vec<DocumentPage>, RagError>;
}
