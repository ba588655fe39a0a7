//! SQLite backend with vector search via `sqlite-vec` and lexical search via
//! FTS5, directly grounded on `wg-ragsmith::stores::sqlite::SqliteChunkStore`
//! (the `register_sqlite_vec` `Once`-guarded extension registration is
//! copied almost verbatim from there).
//!
//! Postgres's `GIN`/`to_tsvector` full-text index (spec.md §4.E) has no
//! SQLite equivalent, so this backend uses FTS5's `bm25()` instead — the
//! closest engine-native analogue available without adding a second
//! database dependency. This substitution is recorded as a Decision in
//! DESIGN.md.
//!
//! Query text is never handed to FTS5's `MATCH` parser raw: `sanitize_fts_query`
//! extracts word tokens and quotes each one, the same `plainto_tsquery`
//! normalization spec.md §4.E/§4.F requires, so a query containing FTS5
//! metacharacters can never produce a syntax error.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Once;

use async_trait::async_trait;
use chrono::Utc;
use tokio_rusqlite::{ffi, Connection, OptionalExtension};

use crate::error::{CoreError, Result};
use crate::ids::{ChunkId, ContentItemId, EmbeddingId, UserId};
use crate::model::{Chunk, ChunkSpan, ContentItem, ContentType, Embedding};

use super::{FulltextHit, Store, VectorHit};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        register_sqlite_vec()?;
        let conn = Connection::open(path).await?;
        conn.call(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }

    /// In-memory store, used in tests and as a quick-start default.
    pub async fn open_in_memory() -> Result<Self> {
        Self::open(":memory:").await
    }
}

fn register_sqlite_vec() -> Result<()> {
    use std::sync::Mutex;

    static INIT: Once = Once::new();
    static INIT_RESULT: Mutex<Option<Result<(), String>>> = Mutex::new(None);

    INIT.call_once(|| {
        let result = unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc != 0 {
                Err(format!("failed to register sqlite-vec extension (code {rc})"))
            } else {
                Ok(())
            }
        };
        *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
    });

    INIT_RESULT
        .lock()
        .expect("init result mutex poisoned")
        .clone()
        .expect("init was called but result not set")
        .map_err(CoreError::StoreFailure)
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS content_items (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    content_type TEXT NOT NULL,
    title TEXT NOT NULL,
    file_path TEXT NOT NULL,
    file_size INTEGER NOT NULL,
    language TEXT NOT NULL,
    source_metadata TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_content_items_user ON content_items(user_id);

CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    content_item_id TEXT NOT NULL REFERENCES content_items(id) ON DELETE CASCADE,
    chunk_text TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    token_count INTEGER NOT NULL,
    chunk_span TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(content_item_id, chunk_index)
);
CREATE INDEX IF NOT EXISTS idx_chunks_content_item ON chunks(content_item_id);

CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
    chunk_text,
    content = 'chunks',
    content_rowid = 'rowid'
);
CREATE TRIGGER IF NOT EXISTS chunks_ai AFTER INSERT ON chunks BEGIN
    INSERT INTO chunks_fts(rowid, chunk_text) VALUES (new.rowid, new.chunk_text);
END;
CREATE TRIGGER IF NOT EXISTS chunks_ad AFTER DELETE ON chunks BEGIN
    INSERT INTO chunks_fts(chunks_fts, rowid, chunk_text) VALUES('delete', old.rowid, old.chunk_text);
END;

CREATE TABLE IF NOT EXISTS embeddings (
    id TEXT PRIMARY KEY,
    chunk_id TEXT NOT NULL REFERENCES chunks(id) ON DELETE CASCADE,
    embedding_model TEXT NOT NULL,
    embedding_dim INTEGER NOT NULL,
    vector TEXT NOT NULL,
    embedding_version INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(chunk_id, embedding_model, embedding_version)
);
CREATE INDEX IF NOT EXISTS idx_embeddings_chunk ON embeddings(chunk_id);
"#;

/// Turns free-form natural-language query text into a safe FTS5 `MATCH`
/// argument, the same normalization `plainto_tsquery` does for Postgres
/// full-text search (spec.md §4.E/§4.F): word tokens are extracted and
/// individually quoted so metacharacters (`"`, `:`, `*`, ...) in the user's
/// text can never be parsed as FTS5 query syntax. A punctuation-only query
/// that tokenizes to nothing returns `None`, signaling "no lexical hits"
/// rather than a SQL syntax error.
fn sanitize_fts_query(query_text: &str) -> Option<String> {
    let terms: Vec<String> = query_text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(|term| format!("\"{term}\""))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

fn content_type_to_str(ct: ContentType) -> &'static str {
    ct.as_str()
}

fn content_type_from_str(s: &str) -> Result<ContentType> {
    match s {
        "document" => Ok(ContentType::Document),
        "audio" => Ok(ContentType::Audio),
        "video" => Ok(ContentType::Video),
        "image" => Ok(ContentType::Image),
        "webpage" => Ok(ContentType::Webpage),
        "email" => Ok(ContentType::Email),
        other => Err(CoreError::InvalidInput(format!(
            "unrecognized content_type '{other}'"
        ))),
    }
}

fn row_to_content_item(row: &tokio_rusqlite::Row<'_>) -> tokio_rusqlite::Result<ContentItemRow> {
    Ok(ContentItemRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        content_type: row.get(2)?,
        title: row.get(3)?,
        file_path: row.get(4)?,
        file_size: row.get::<_, i64>(5)? as u64,
        language: row.get(6)?,
        source_metadata: row.get(7)?,
        created_at: row.get(8)?,
    })
}

struct ContentItemRow {
    id: String,
    user_id: String,
    content_type: String,
    title: String,
    file_path: String,
    file_size: u64,
    language: String,
    source_metadata: String,
    created_at: String,
}

impl ContentItemRow {
    fn into_model(self) -> Result<ContentItem> {
        Ok(ContentItem {
            id: self.id.parse().map_err(|_| CoreError::StoreFailure("bad id".into()))?,
            user_id: self
                .user_id
                .parse()
                .map_err(|_| CoreError::StoreFailure("bad user_id".into()))?,
            content_type: content_type_from_str(&self.content_type)?,
            title: self.title,
            file_path: self.file_path,
            file_size: self.file_size,
            language: self.language,
            source_metadata: serde_json::from_str(&self.source_metadata).unwrap_or_default(),
            created_at: self
                .created_at
                .parse()
                .map_err(|_| CoreError::StoreFailure("bad created_at".into()))?,
        })
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_content_item(&self, item: &ContentItem) -> Result<()> {
        let item = item.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO content_items
                        (id, user_id, content_type, title, file_path, file_size, language, source_metadata, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    tokio_rusqlite::params![
                        item.id.to_string(),
                        item.user_id.to_string(),
                        content_type_to_str(item.content_type),
                        item.title,
                        item.file_path,
                        item.file_size as i64,
                        item.language,
                        serde_json::to_string(&item.source_metadata).unwrap_or_default(),
                        item.created_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn insert_chunk(&self, chunk: &Chunk) -> Result<()> {
        let chunk = chunk.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO chunks
                        (id, content_item_id, chunk_text, chunk_index, token_count, chunk_span, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    tokio_rusqlite::params![
                        chunk.id.to_string(),
                        chunk.content_item_id.to_string(),
                        chunk.chunk_text,
                        chunk.chunk_index,
                        chunk.token_count,
                        serde_json::to_string(&chunk.chunk_span).unwrap_or_default(),
                        chunk.created_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn insert_embedding(&self, embedding: &Embedding) -> Result<()> {
        let embedding = embedding.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO embeddings
                        (id, chunk_id, embedding_model, embedding_dim, vector, embedding_version, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    tokio_rusqlite::params![
                        embedding.id.to_string(),
                        embedding.chunk_id.to_string(),
                        embedding.embedding_model,
                        embedding.embedding_dim,
                        serde_json::to_string(&embedding.vector).unwrap_or_default(),
                        embedding.embedding_version,
                        embedding.created_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn get_content_item(
        &self,
        user_id: UserId,
        id: ContentItemId,
    ) -> Result<Option<ContentItem>> {
        let (user_id, id) = (user_id.to_string(), id.to_string());
        let row = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT id, user_id, content_type, title, file_path, file_size, language, source_metadata, created_at
                     FROM content_items WHERE id = ?1 AND user_id = ?2",
                    tokio_rusqlite::params![id, user_id],
                    |row| row_to_content_item(row),
                )
                .optional()
            })
            .await?;
        row.map(ContentItemRow::into_model).transpose()
    }

    async fn list_content_items(
        &self,
        user_id: UserId,
        content_type: Option<ContentType>,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let user_id = user_id.to_string();
        let content_type = content_type.map(content_type_to_str);
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, content_type, title, file_path, file_size, language, source_metadata, created_at
                     FROM content_items
                     WHERE user_id = ?1 AND (?2 IS NULL OR content_type = ?2)
                     ORDER BY created_at DESC
                     LIMIT ?3",
                )?;
                let mapped = stmt
                    .query_map(
                        tokio_rusqlite::params![user_id, content_type, limit as i64],
                        row_to_content_item,
                    )?
                    .collect::<tokio_rusqlite::Result<Vec<_>>>()?;
                Ok(mapped)
            })
            .await?;
        rows.into_iter().map(ContentItemRow::into_model).collect()
    }

    async fn get_chunks(
        &self,
        user_id: UserId,
        content_item_id: ContentItemId,
    ) -> Result<Vec<Chunk>> {
        let (user_id, content_item_id) = (user_id.to_string(), content_item_id.to_string());
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT c.id, c.content_item_id, c.chunk_text, c.chunk_index, c.token_count, c.chunk_span, c.created_at
                     FROM chunks c
                     JOIN content_items ci ON ci.id = c.content_item_id
                     WHERE c.content_item_id = ?1 AND ci.user_id = ?2
                     ORDER BY c.chunk_index ASC",
                )?;
                let mapped = stmt
                    .query_map(tokio_rusqlite::params![content_item_id, user_id], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, u32>(3)?,
                            row.get::<_, u32>(4)?,
                            row.get::<_, String>(5)?,
                            row.get::<_, String>(6)?,
                        ))
                    })?
                    .collect::<tokio_rusqlite::Result<Vec<_>>>()?;
                Ok(mapped)
            })
            .await?;

        rows.into_iter()
            .map(|(id, content_item_id, chunk_text, chunk_index, token_count, chunk_span, created_at)| {
                Ok(Chunk {
                    id: id.parse().map_err(|_| CoreError::StoreFailure("bad chunk id".into()))?,
                    content_item_id: content_item_id
                        .parse()
                        .map_err(|_| CoreError::StoreFailure("bad content_item_id".into()))?,
                    chunk_text,
                    chunk_index,
                    token_count,
                    chunk_span: serde_json::from_str::<ChunkSpan>(&chunk_span)
                        .map_err(|err| CoreError::StoreFailure(err.to_string()))?,
                    created_at: created_at
                        .parse()
                        .map_err(|_| CoreError::StoreFailure("bad created_at".into()))?,
                })
            })
            .collect()
    }

    async fn embedding_count(&self, chunk_id: ChunkId, model: &str, version: u32) -> Result<usize> {
        let (chunk_id, model) = (chunk_id.to_string(), model.to_string());
        let count: i64 = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM embeddings WHERE chunk_id = ?1 AND embedding_model = ?2 AND embedding_version = ?3",
                    tokio_rusqlite::params![chunk_id, model, version],
                    |row| row.get(0),
                )
            })
            .await?;
        Ok(count as usize)
    }

    async fn vector_search(
        &self,
        user_id: UserId,
        query_vector: &[f32],
        model: &str,
        k: usize,
    ) -> Result<Vec<VectorHit>> {
        let user_id = user_id.to_string();
        let model = model.to_string();
        let query_json = serde_json::to_string(query_vector)?;

        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT c.id, c.content_item_id, c.chunk_text, c.chunk_span, ci.title, ci.content_type,
                            vec_distance_cosine(vec_f32(e.vector), vec_f32(?1)) AS distance
                     FROM embeddings e
                     JOIN chunks c ON c.id = e.chunk_id
                     JOIN content_items ci ON ci.id = c.content_item_id
                     WHERE ci.user_id = ?2 AND e.embedding_model = ?3
                     ORDER BY distance ASC
                     LIMIT ?4",
                )?;
                let mapped = stmt
                    .query_map(
                        tokio_rusqlite::params![query_json, user_id, model, k as i64],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, String>(2)?,
                                row.get::<_, String>(3)?,
                                row.get::<_, String>(4)?,
                                row.get::<_, String>(5)?,
                                row.get::<_, f32>(6)?,
                            ))
                        },
                    )?
                    .collect::<tokio_rusqlite::Result<Vec<_>>>()?;
                Ok(mapped)
            })
            .await?;

        rows.into_iter()
            .map(|(chunk_id, content_item_id, chunk_text, chunk_span, title, content_type, distance)| {
                Ok(VectorHit {
                    chunk_id: chunk_id.parse().map_err(|_| CoreError::StoreFailure("bad chunk id".into()))?,
                    content_item_id: content_item_id
                        .parse()
                        .map_err(|_| CoreError::StoreFailure("bad content_item_id".into()))?,
                    chunk_text,
                    chunk_span: serde_json::from_str(&chunk_span)
                        .map_err(|err| CoreError::StoreFailure(err.to_string()))?,
                    title,
                    content_type: content_type_from_str(&content_type)?,
                    distance,
                })
            })
            .collect()
    }

    async fn fulltext_search(
        &self,
        user_id: UserId,
        query_text: &str,
        k: usize,
    ) -> Result<Vec<FulltextHit>> {
        let Some(sanitized_query) = sanitize_fts_query(query_text) else {
            return Ok(Vec::new());
        };
        let user_id = user_id.to_string();

        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT c.id, c.content_item_id, c.chunk_text, c.chunk_span, ci.title, ci.content_type,
                            -bm25(chunks_fts) AS rank
                     FROM chunks_fts
                     JOIN chunks c ON c.rowid = chunks_fts.rowid
                     JOIN content_items ci ON ci.id = c.content_item_id
                     WHERE chunks_fts MATCH ?1 AND ci.user_id = ?2
                     ORDER BY rank DESC
                     LIMIT ?3",
                )?;
                let mapped = stmt
                    .query_map(
                        tokio_rusqlite::params![sanitized_query, user_id, k as i64],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, String>(2)?,
                                row.get::<_, String>(3)?,
                                row.get::<_, String>(4)?,
                                row.get::<_, String>(5)?,
                                row.get::<_, f32>(6)?,
                            ))
                        },
                    )?
                    .collect::<tokio_rusqlite::Result<Vec<_>>>()?;
                Ok(mapped)
            })
            .await?;

        rows.into_iter()
            .map(|(chunk_id, content_item_id, chunk_text, chunk_span, title, content_type, rank)| {
                Ok(FulltextHit {
                    chunk_id: chunk_id.parse().map_err(|_| CoreError::StoreFailure("bad chunk id".into()))?,
                    content_item_id: content_item_id
                        .parse()
                        .map_err(|_| CoreError::StoreFailure("bad content_item_id".into()))?,
                    chunk_text,
                    chunk_span: serde_json::from_str(&chunk_span)
                        .map_err(|err| CoreError::StoreFailure(err.to_string()))?,
                    title,
                    content_type: content_type_from_str(&content_type)?,
                    rank,
                })
            })
            .collect()
    }

    async fn delete_content_item(&self, user_id: UserId, id: ContentItemId) -> Result<()> {
        let (user_id, id) = (user_id.to_string(), id.to_string());
        self.conn
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM content_items WHERE id = ?1 AND user_id = ?2",
                    tokio_rusqlite::params![id, user_id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}
