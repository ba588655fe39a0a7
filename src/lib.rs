//! Document ingestion and hybrid question-answering for a personal
//! knowledge base.
//!
//! ```text
//! bytes ──► extraction ──► chunker (tokenizer-aware) ──► embedder ──► store
//!                                                                      │
//! query ──► retriever (vector + fulltext fusion) ◄────────────────────┘
//!                │
//!                └─► llm (answer extraction) ──► qa::QaSearch ──► AnswerResult
//! ```
//!
//! [`ingestion::IngestionPipeline`] drives the write path: a document is
//! extracted, persisted as a `ContentItem`, then chunked/embedded/stored in
//! a background task. [`qa::QaSearch`] drives the read path: a query is
//! fused across vector and lexical channels by [`retriever::HybridRetriever`],
//! then each candidate chunk is turned into an answer by an [`llm::LlmClient`]
//! adaptor.

pub mod chunker;
pub mod config;
pub mod embedder;
pub mod error;
pub mod extraction;
pub mod ids;
pub mod ingestion;
pub mod llm;
pub mod model;
pub mod qa;
pub mod retriever;
pub mod store;
pub mod telemetry;
pub mod tokenizer;

pub use config::RagcoreConfig;
pub use error::{CoreError, Result};
pub use ingestion::{IngestOutcome, IngestionPipeline};
pub use model::{AnswerResult, Chunk, ChunkSpan, ContentItem, ContentType, Embedding, Query};
pub use qa::QaSearch;
pub use retriever::HybridRetriever;
pub use store::{SqliteStore, Store};
