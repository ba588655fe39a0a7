//! The Ingestion Pipeline orchestrator: drives Extractor -> Tokenizer ->
//! Chunker -> Embedder -> Store per document, per spec.md §2/§5.
//!
//! The caller gets its `ContentItem` back as soon as extraction succeeds;
//! chunking, embedding, and embedding-storage continue in a background
//! task attached to the process rather than the request, the same split
//! `wg-ragsmith::ingestion::chunk` assumes between "ingestion outcome" and
//! the persistence batch derived from it.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::chunker::SentenceChunker;
use crate::config::ChunkingConfig;
use crate::embedder::Embedder;
use crate::error::Result;
use crate::extraction;
use crate::ids::{ChunkId, ContentItemId, EmbeddingId};
use crate::ids::UserId;
use crate::model::{Chunk, ChunkSpan, ContentItem, ContentType, Embedding};
use crate::store::Store;

/// What the caller gets back immediately; chunking/embedding continue
/// asynchronously after this is returned.
#[derive(Clone, Debug)]
pub struct IngestOutcome {
    pub content_item: ContentItem,
}

pub struct IngestionPipeline {
    store: Arc<dyn Store>,
    embedder: Arc<dyn Embedder>,
    chunker: Arc<SentenceChunker>,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn Store>,
        embedder: Arc<dyn Embedder>,
        tokenizer: Arc<dyn crate::tokenizer::Tokenizer>,
        chunking: &ChunkingConfig,
    ) -> Self {
        let chunker = SentenceChunker::new(tokenizer, chunking.max_tokens, chunking.overlap_tokens);
        Self {
            store,
            embedder,
            chunker: Arc::new(chunker),
        }
    }

    /// Extracts text, persists the `ContentItem`, and spawns the background
    /// chunk+embed+store task. Returns as soon as the `ContentItem` row is
    /// written, per spec.md §5 "Scheduling model".
    pub async fn ingest(
        &self,
        user_id: UserId,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(IngestOutcome, CancellationToken)> {
        let extracted = extraction::extract(&bytes, filename)?;

        let content_item = ContentItem {
            id: ContentItemId::new(),
            user_id,
            content_type: ContentType::Document,
            title: title_from_filename(filename),
            file_path: filename.to_string(),
            file_size: bytes.len() as u64,
            language: "en".to_string(),
            source_metadata: Default::default(),
            created_at: Utc::now(),
        };
        self.store.insert_content_item(&content_item).await?;

        let cancel = CancellationToken::new();
        let background_cancel = cancel.clone();
        let store = Arc::clone(&self.store);
        let embedder = Arc::clone(&self.embedder);
        let chunker = Arc::clone(&self.chunker);
        let content_item_id = content_item.id;
        let text = extracted.text;

        tokio::spawn(async move {
            let outcome = run_chunk_embed_store(
                store,
                embedder,
                chunker,
                content_item_id,
                &text,
                background_cancel,
            )
            .await;
            if let Err(err) = outcome {
                tracing::error!(
                    content_item_id = %content_item_id,
                    error = %err,
                    "background ingestion failed"
                );
            }
        });

        Ok((IngestOutcome { content_item }, cancel))
    }
}

/// Per spec.md §7 "Propagation policy": a failure on one chunk is logged
/// and skipped, not fatal to the document; the document is retrievable as
/// soon as at least one (Chunk, Embedding) pair lands.
async fn run_chunk_embed_store(
    store: Arc<dyn Store>,
    embedder: Arc<dyn Embedder>,
    chunker: Arc<SentenceChunker>,
    content_item_id: ContentItemId,
    text: &str,
    cancel: CancellationToken,
) -> Result<()> {
    let (pieces, telemetry) = chunker.chunk(text);
    tracing::debug!(
        content_item_id = %content_item_id,
        chunk_count = telemetry.chunk_count,
        fallback_used = telemetry.fallback_used,
        "chunking complete, beginning embed+store"
    );

    let mut persisted = 0usize;
    for (index, piece) in pieces.into_iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::info!(content_item_id = %content_item_id, "ingestion cancelled mid-document");
            break;
        }

        let chunk = Chunk {
            id: ChunkId::new(),
            content_item_id,
            chunk_text: piece.text.clone(),
            chunk_index: index as u32,
            token_count: piece.token_count as u32,
            chunk_span: ChunkSpan::Document {
                page: None,
                start_char: piece.start_char,
                end_char: piece.end_char,
            },
            created_at: Utc::now(),
        };

        if let Err(err) = store.insert_chunk(&chunk).await {
            tracing::warn!(chunk_index = index, error = %err, "chunk persist failed, skipping");
            continue;
        }

        match embedder.embed(&piece.text).await {
            Ok(vector) => {
                let embedding = Embedding {
                    id: EmbeddingId::new(),
                    chunk_id: chunk.id,
                    embedding_model: vector.model,
                    embedding_dim: vector.dim,
                    vector: vector.vector,
                    embedding_version: vector.version,
                    created_at: Utc::now(),
                };
                match store.insert_embedding(&embedding).await {
                    Ok(()) => persisted += 1,
                    Err(err) => {
                        tracing::warn!(chunk_index = index, error = %err, "embedding persist failed")
                    }
                }
            }
            Err(err) => {
                tracing::warn!(chunk_index = index, error = %err, "embedding failed, chunk has no vector yet");
            }
        }
    }

    if persisted == 0 {
        tracing::warn!(
            content_item_id = %content_item_id,
            "no chunk was embedded; content item persisted but not retrievable"
        );
    }

    Ok(())
}

fn title_from_filename(filename: &str) -> String {
    let stem = filename.rsplit('/').next().unwrap_or(filename);
    match stem.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem.to_string(),
        _ => stem.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_strips_extension_and_directory() {
        assert_eq!(title_from_filename("notes/meeting.txt"), "meeting");
        assert_eq!(title_from_filename("report.final.docx"), "report.final");
        assert_eq!(title_from_filename("README"), "README");
    }
}
