//! Text -> dense vector, under a named model and version (spec.md §4.D).

mod mock;
mod provider;

pub use mock::MockEmbedder;
pub use provider::ProviderEmbedder;

use async_trait::async_trait;

use crate::error::Result;

/// One embedding result, tagged with the model/version that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingVector {
    pub vector: Vec<f32>,
    pub model: String,
    pub dim: u32,
    pub version: u32,
}

/// The model tag mock embeddings are stamped with so the retriever's Store
/// query can exclude them from production results (spec.md §4.D, §9).
pub const MOCK_EMBEDDING_MODEL: &str = "mock-embedding-dev";

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;
}
