//! Data model shared by the ingestion pipeline and the QA surface.
//!
//! Sources (audio, document, image, web) share the
//! `ContentItem -> Chunk -> Embedding` skeleton and differ only in
//! [`ContentType`] and the shape of [`ChunkSpan`]; both are tagged variants
//! over data, never a subclass hierarchy, per the design note in spec.md §9.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::ids::{ChunkId, ContentItemId, EmbeddingId, UserId};

/// The modality of an uploaded artefact.
///
/// Only [`ContentType::Document`] is produced by this crate's ingestion
/// pipeline; the other variants are schema-reserved so the `Chunk`/
/// `AnswerResult` attribution logic has somewhere to route metadata for
/// modalities ingested by other collaborators (e.g. an audio transcriber).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Document,
    Audio,
    Video,
    Image,
    Webpage,
    Email,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Document => "document",
            ContentType::Audio => "audio",
            ContentType::Video => "video",
            ContentType::Image => "image",
            ContentType::Webpage => "webpage",
            ContentType::Email => "email",
        }
    }
}

/// One uploaded document, owned by a [`UserId`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentItemId,
    pub user_id: UserId,
    pub content_type: ContentType,
    pub title: String,
    pub file_path: String,
    pub file_size: u64,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub source_metadata: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
}

fn default_language() -> String {
    "en".to_string()
}

/// The structured locator identifying where a chunk comes from in its source.
///
/// A tagged enum rather than three optional field groups on [`Chunk`], so a
/// document chunk can never accidentally carry a `speaker_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkSpan {
    Document {
        page: Option<u32>,
        start_char: usize,
        end_char: usize,
    },
    Audio {
        start_time_s: f64,
        end_time_s: f64,
        speaker_id: Option<String>,
    },
    Web {
        section: String,
    },
}

/// A retrievable text span within a [`ContentItem`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub content_item_id: ContentItemId,
    pub chunk_text: String,
    pub chunk_index: u32,
    pub token_count: u32,
    pub chunk_span: ChunkSpan,
    pub created_at: DateTime<Utc>,
}

/// A dense vector for one chunk, under one embedding model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Embedding {
    pub id: EmbeddingId,
    pub chunk_id: ChunkId,
    pub embedding_model: String,
    pub embedding_dim: u32,
    pub vector: Vec<f32>,
    pub embedding_version: u32,
    pub created_at: DateTime<Utc>,
}

/// A transient natural-language question against one user's knowledge base.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Query {
    pub user_id: UserId,
    pub query_text: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    5
}

/// One extracted answer for one `(query, chunk)` pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub confidence: f32,
    pub has_answer: bool,
    pub chunk_id: ChunkId,
    pub source_chunk: String,
    pub source_title: String,
    pub content_type: ContentType,
    pub page_num: Option<u32>,
    pub start_time_s: Option<f64>,
    pub end_time_s: Option<f64>,
    pub speaker: Option<String>,
}

impl AnswerResult {
    /// Clamp confidence into `[0, 1]`, per spec.md §4.G post-processing.
    pub fn clamp_confidence(mut self) -> Self {
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }
}
