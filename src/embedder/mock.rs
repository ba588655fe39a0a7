//! Deterministic pseudo-embedding used only to keep development environments
//! running when the real provider is unreachable (spec.md §4.D, §9).
//!
//! Vectors are tagged with [`MOCK_EMBEDDING_MODEL`], a value that cannot
//! collide with a real provider's model tag, so the Store's vector-search
//! query (scoped to the active production model) naturally excludes them.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::embedder::{Embedder, EmbeddingVector, MOCK_EMBEDDING_MODEL};
use crate::error::Result;

pub struct MockEmbedder {
    dim: u32,
}

impl MockEmbedder {
    pub fn new(dim: u32) -> Self {
        Self { dim }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(1536)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let vector = (0..self.dim)
            .map(|i| {
                let mut hasher = DefaultHasher::new();
                text.hash(&mut hasher);
                i.hash(&mut hasher);
                let bits = hasher.finish();
                // Map into [-1.0, 1.0] deterministically.
                ((bits % 2_000_001) as f32 / 1_000_000.0) - 1.0
            })
            .collect();

        Ok(EmbeddingVector {
            vector,
            model: MOCK_EMBEDDING_MODEL.to_string(),
            dim: self.dim,
            version: 1,
        })
    }
}
