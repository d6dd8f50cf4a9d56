use async_trait::async_trait;

use crate::error::ProfileResult;

/// Trait for embedding generation providers
///
/// One attempt per call; failures surface as `ProfileError::Embedding`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> ProfileResult<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order
    async fn embed_batch(&self, texts: &[String]) -> ProfileResult<Vec<Vec<f32>>>;
}
