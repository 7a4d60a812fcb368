pub mod azure;
pub mod local;

/// Maps text to a fixed-length vector.
///
/// Implementations own their transport and any retry policy; the retrieval
/// core calls `embed` once per text and propagates the first failure.
pub trait Embedder {
    /// Embed a single text.
    fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Identifier of the model behind this embedder, recorded with the index.
    fn model_id(&self) -> &str;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        (**self).embed(text)
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}
