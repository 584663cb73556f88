//! Embedding gateway trait.

use async_trait::async_trait;

use crate::Result;

#[async_trait]
pub trait Embedder: Send + Sync + 'static {
    /// Embed a single piece of text into a fixed-dimension vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts. Implementations may fan these out
    /// concurrently, but must preserve input order in the output.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Output vector dimension (1536 for the default embedding model).
    fn dimension(&self) -> usize;
}
