//! Persistence for ContentItems, Chunks, and Embeddings, with both vector
//! and full-text search (spec.md §4.E).
//!
//! Generalizes `wg-ragsmith::stores::Backend` (a single `chunks` table) to
//! the three-table schema spec.md names, keeping the same async-trait shape
//! and the same "backend-agnostic record, concrete backend implements the
//! trait" split.

pub mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::ids::{ChunkId, ContentItemId, UserId};
use crate::model::{Chunk, ContentItem, ContentType, Embedding};

/// One row returned by [`Store::vector_search`].
#[derive(Clone, Debug)]
pub struct VectorHit {
    pub chunk_id: ChunkId,
    pub content_item_id: ContentItemId,
    pub chunk_text: String,
    pub chunk_span: crate::model::ChunkSpan,
    pub title: String,
    pub content_type: ContentType,
    /// Cosine distance; smaller is more similar.
    pub distance: f32,
}

/// One row returned by [`Store::fulltext_search`].
#[derive(Clone, Debug)]
pub struct FulltextHit {
    pub chunk_id: ChunkId,
    pub content_item_id: ContentItemId,
    pub chunk_text: String,
    pub chunk_span: crate::model::ChunkSpan,
    pub title: String,
    pub content_type: ContentType,
    /// `ts_rank`-style lexical rank; larger is more relevant.
    pub rank: f32,
}

/// Persistence operations the ingestion pipeline and retriever depend on.
///
/// Every read is implicitly scoped to the requesting `user_id`, per
/// spec.md §4.E "Row-level isolation".
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_content_item(&self, item: &ContentItem) -> Result<()>;
    async fn insert_chunk(&self, chunk: &Chunk) -> Result<()>;
    async fn insert_embedding(&self, embedding: &Embedding) -> Result<()>;

    async fn get_content_item(
        &self,
        user_id: UserId,
        id: ContentItemId,
    ) -> Result<Option<ContentItem>>;

    async fn list_content_items(
        &self,
        user_id: UserId,
        content_type: Option<ContentType>,
        limit: usize,
    ) -> Result<Vec<ContentItem>>;

    async fn get_chunks(
        &self,
        user_id: UserId,
        content_item_id: ContentItemId,
    ) -> Result<Vec<Chunk>>;

    /// Number of embeddings persisted for `chunk_id` under the active
    /// `(model, version)`. Used to decide when a document is ready for
    /// retrieval, per spec.md §5 "Ordering guarantees".
    async fn embedding_count(&self, chunk_id: ChunkId, model: &str, version: u32) -> Result<usize>;

    async fn vector_search(
        &self,
        user_id: UserId,
        query_vector: &[f32],
        model: &str,
        k: usize,
    ) -> Result<Vec<VectorHit>>;

    async fn fulltext_search(
        &self,
        user_id: UserId,
        query_text: &str,
        k: usize,
    ) -> Result<Vec<FulltextHit>>;

    /// Cascade-deletes a ContentItem and its Chunks/Embeddings, per
    /// spec.md §3 "Ownership".
    async fn delete_content_item(&self, user_id: UserId, id: ContentItemId) -> Result<()>;
}
