//! SQLite-backed vector index with FTS5 keyword search and int8 vector search.
//!
//! One database file per collection. Chunk embeddings are stored quantized
//! and held in memory as a normalized matrix for cosine search.

use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Axis};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::embedding::{dequantize_uint8, normalized, quantize_uint8};
use crate::schema::{FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL, PROFILE_SCHEMA_SQL, SCHEMA_SQL};
use crate::types::*;
use mindful_core::{Error, Result};

/// SQLite store holding the chunk index and user profiles.
pub struct SqliteStore {
    pub(crate) conn: Mutex<Connection>,
    db_path: PathBuf,
    embedding_dim: usize,
    embedding_matrix: Mutex<EmbeddingMatrix>,
}

struct EmbeddingMatrix {
    /// Normalized embeddings, shape (N, dim).
    matrix: Array2<f32>,
    /// Chunk IDs corresponding to each row.
    chunk_ids: Vec<i64>,
    dirty: bool,
}

pub(crate) fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl SqliteStore {
    /// Open or create the store at `db_path` (e.g. `data/vectordb/my_collection.db`).
    pub fn open(db_path: impl AsRef<Path>, embedding_dim: usize) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
        }

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
            embedding_dim,
            embedding_matrix: Mutex::new(EmbeddingMatrix {
                matrix: Array2::zeros((0, embedding_dim)),
                chunk_ids: Vec::new(),
                dirty: true,
            }),
        };

        store.load_embedding_matrix()?;

        info!(
            "SqliteStore opened: {} documents, {} chunks, dim={}, path={}",
            store.count_documents()?,
            store.count_chunks()?,
            embedding_dim,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let full_schema = format!(
            "{}\n{}\n{}\n{}",
            SCHEMA_SQL, FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL, PROFILE_SCHEMA_SQL
        );
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    // ---------------------------------------------------------------
    // Documents
    // ---------------------------------------------------------------

    /// Record a source file. Fails with `DuplicateContent` if the hash exists.
    pub fn add_document(
        &self,
        source: &str,
        page_count: usize,
        content_hash: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn.lock();
        let id = Self::insert_document(&conn, source, page_count, content_hash)?;
        Ok(id)
    }

    /// Record a source file together with its chunks in one transaction.
    /// Nothing is written if any insert fails.
    pub fn add_document_with_chunks(
        &self,
        source: &str,
        page_count: usize,
        content_hash: Option<&str>,
        chunks: &[NewChunk],
    ) -> Result<(i64, Vec<i64>)> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;
        let doc_id = Self::insert_document(&tx, source, page_count, content_hash)?;
        let ids = Self::insert_chunks(&tx, doc_id, chunks)?;
        tx.commit().map_err(db_err)?;
        Ok((doc_id, ids))
    }

    /// Remove a document; its chunks, embeddings and FTS rows go with it.
    pub fn delete_document(&self, doc_id: i64) -> Result<bool> {
        let deleted = {
            let conn = self.conn.lock();
            conn.execute("DELETE FROM documents WHERE id = ?1", params![doc_id])
                .map_err(db_err)?
        };
        if deleted > 0 {
            self.embedding_matrix.lock().dirty = true;
        }
        Ok(deleted > 0)
    }

    fn insert_document(
        conn: &Connection,
        source: &str,
        page_count: usize,
        content_hash: Option<&str>,
    ) -> Result<i64> {
        let id = conn
            .prepare_cached(
                "INSERT INTO documents (source, page_count, content_hash, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(db_err)?
            .insert(params![source, page_count as i64, content_hash, now_millis()])
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint") {
                    Error::DuplicateContent(content_hash.unwrap_or_default().to_string())
                } else {
                    db_err(e)
                }
            })?;
        Ok(id)
    }

    pub fn find_document_by_hash(&self, content_hash: &str) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        let doc = conn
            .prepare_cached("SELECT * FROM documents WHERE content_hash = ?1")
            .map_err(db_err)?
            .query_row(params![content_hash], Self::row_to_document)
            .optional()
            .map_err(db_err)?;
        Ok(doc)
    }

    pub fn count_documents(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let count = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(count)
    }

    // ---------------------------------------------------------------
    // Chunks
    // ---------------------------------------------------------------

    /// Insert a batch of chunks for a document in one transaction.
    /// Returns the new chunk IDs in input order.
    pub fn add_chunks(&self, doc_id: i64, chunks: &[NewChunk]) -> Result<Vec<i64>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;
        let ids = Self::insert_chunks(&tx, doc_id, chunks)?;
        tx.commit().map_err(db_err)?;
        Ok(ids)
    }

    fn insert_chunks(conn: &Connection, doc_id: i64, chunks: &[NewChunk]) -> Result<Vec<i64>> {
        let now = now_millis();
        let mut stmt = conn
            .prepare_cached(
                "INSERT INTO chunks (doc_id, content, source, page, chunk_index, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(db_err)?;
        let mut ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let id = stmt
                .insert(params![
                    doc_id,
                    chunk.content,
                    chunk.source,
                    chunk.page as i64,
                    chunk.chunk_index as i64,
                    now,
                ])
                .map_err(db_err)?;
            ids.push(id);
        }
        Ok(ids)
    }

    pub fn get_chunk(&self, chunk_id: i64) -> Result<Option<Chunk>> {
        let conn = self.conn.lock();
        let chunk = conn
            .prepare_cached("SELECT * FROM chunks WHERE id = ?1")
            .map_err(db_err)?
            .query_row(params![chunk_id], Self::row_to_chunk)
            .optional()
            .map_err(db_err)?;
        Ok(chunk)
    }

    pub fn get_chunks_for_document(&self, doc_id: i64) -> Result<Vec<Chunk>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM chunks WHERE doc_id = ?1 ORDER BY chunk_index")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![doc_id], Self::row_to_chunk)
            .map_err(db_err)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)
    }

    pub fn count_chunks(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let count = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(count)
    }

    // ---------------------------------------------------------------
    // Embeddings
    // ---------------------------------------------------------------

    /// Store a quantized embedding and add it to the in-memory matrix.
    pub fn add_chunk_embedding(&self, chunk_id: i64, embedding: &Array1<f32>) -> Result<()> {
        if embedding.len() != self.embedding_dim {
            return Err(Error::Storage(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.embedding_dim,
                embedding.len()
            )));
        }

        let (q_bytes, scale, offset) = quantize_uint8(embedding);
        {
            let conn = self.conn.lock();
            conn.execute(
                "INSERT OR REPLACE INTO chunk_embeddings (chunk_id, embedding, scale, offset_val) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![chunk_id, q_bytes, scale, offset],
            )
            .map_err(db_err)?;
        }

        let mut mat = self.embedding_matrix.lock();
        if mat.dirty {
            // Reloaded lazily on next search.
            return Ok(());
        }
        if let Some(row) = normalized(embedding) {
            if let Some(pos) = mat.chunk_ids.iter().position(|&id| id == chunk_id) {
                mat.matrix.row_mut(pos).assign(&row);
            } else {
                mat.matrix
                    .push(Axis(0), row.view())
                    .map_err(|e| Error::Internal(format!("Matrix append failed: {}", e)))?;
                mat.chunk_ids.push(chunk_id);
            }
        }
        Ok(())
    }

    fn load_embedding_matrix(&self) -> Result<()> {
        let mut chunk_ids = Vec::new();
        let mut rows: Vec<Array1<f32>> = Vec::new();

        {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare("SELECT chunk_id, embedding, scale, offset_val FROM chunk_embeddings")
                .map_err(db_err)?;
            let iter = stmt
                .query_map([], |row| {
                    let chunk_id: i64 = row.get(0)?;
                    let blob: Vec<u8> = row.get(1)?;
                    let scale: f64 = row.get(2)?;
                    let offset: f64 = row.get(3)?;
                    Ok((chunk_id, blob, scale as f32, offset as f32))
                })
                .map_err(db_err)?;

            for row in iter {
                let (cid, blob, scale, offset) = row.map_err(db_err)?;
                if blob.len() != self.embedding_dim {
                    continue;
                }
                if let Some(emb) = normalized(&dequantize_uint8(&blob, scale, offset)) {
                    chunk_ids.push(cid);
                    rows.push(emb);
                }
            }
        }

        let mut matrix = Array2::zeros((rows.len(), self.embedding_dim));
        for (i, emb) in rows.iter().enumerate() {
            matrix.row_mut(i).assign(emb);
        }

        let mut mat = self.embedding_matrix.lock();
        mat.matrix = matrix;
        mat.chunk_ids = chunk_ids;
        mat.dirty = false;
        debug!("Loaded {} embeddings into matrix", mat.chunk_ids.len());
        Ok(())
    }

    fn ensure_matrix_loaded(&self) -> Result<()> {
        let dirty = self.embedding_matrix.lock().dirty;
        if dirty {
            self.load_embedding_matrix()?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Search
    // ---------------------------------------------------------------

    /// Cosine similarity search. Every one of the top `top_k` rows is
    /// returned regardless of score.
    pub fn vector_search(&self, query_embedding: &Array1<f32>, top_k: usize) -> Result<Vec<SearchHit>> {
        self.ensure_matrix_loaded()?;

        let q = match normalized(query_embedding) {
            Some(q) => q,
            None => return Ok(Vec::new()),
        };

        let top: Vec<(i64, f64)> = {
            let mat = self.embedding_matrix.lock();
            if mat.matrix.nrows() == 0 || q.len() != mat.matrix.ncols() {
                return Ok(Vec::new());
            }

            let similarities = mat.matrix.dot(&q);
            let mut indexed: Vec<(usize, f32)> = similarities.iter().copied().enumerate().collect();
            indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            indexed.truncate(top_k);
            indexed
                .into_iter()
                .map(|(i, s)| (mat.chunk_ids[i], s as f64))
                .collect()
        };

        let mut hits = Vec::with_capacity(top.len());
        for (cid, score) in top {
            if let Some(chunk) = self.get_chunk(cid)? {
                hits.push(SearchHit {
                    chunk_id: chunk.id,
                    content: chunk.content,
                    source: chunk.source,
                    page: chunk.page,
                    score,
                });
            }
        }
        Ok(hits)
    }

    /// Full-text search using FTS5 BM25 ranking.
    pub fn bm25_search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let fts_query = Self::sanitize_fts_query(query);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT c.id, c.content, c.source, c.page, chunks_fts.rank AS bm25_score \
                 FROM chunks_fts \
                 JOIN chunks c ON c.id = chunks_fts.rowid \
                 WHERE chunks_fts MATCH ?1 \
                 ORDER BY chunks_fts.rank \
                 LIMIT ?2",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![fts_query, top_k as i64], |row| {
                let bm25_score: f64 = row.get("bm25_score")?;
                Ok(SearchHit {
                    chunk_id: row.get("id")?,
                    content: row.get("content")?,
                    source: row.get("source")?,
                    page: row.get("page")?,
                    // FTS5 rank is negative; negate for positive
                    score: -bm25_score,
                })
            })
            .map_err(db_err)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)
    }

    /// Quote each token and join with OR so user text never hits FTS5 syntax.
    fn sanitize_fts_query(query: &str) -> String {
        query
            .split_whitespace()
            .map(|t| t.replace('"', ""))
            .filter(|t| !t.is_empty())
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(" OR ")
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    /// Index totals, reported after an ingestion run.
    pub fn get_stats(&self) -> Result<StoreStats> {
        let total_documents = self.count_documents()?;
        let total_chunks = self.count_chunks()?;

        let (embeddings_stored, user_profiles) = {
            let conn = self.conn.lock();
            let emb: i64 = conn
                .query_row("SELECT COUNT(*) FROM chunk_embeddings", [], |row| row.get(0))
                .map_err(db_err)?;
            let profiles: i64 = conn
                .query_row("SELECT COUNT(*) FROM user_profiles", [], |row| row.get(0))
                .map_err(db_err)?;
            (emb, profiles)
        };

        let db_size = std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0);

        Ok(StoreStats {
            total_documents,
            total_chunks,
            embeddings_stored,
            embedding_dimension: self.embedding_dim,
            user_profiles,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
        })
    }

    // ---------------------------------------------------------------
    // Row mapping
    // ---------------------------------------------------------------

    fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
        Ok(Document {
            id: row.get("id")?,
            source: row.get("source")?,
            page_count: row.get("page_count")?,
            content_hash: row.get("content_hash")?,
            created_at: row.get("created_at")?,
        })
    }

    fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chunk> {
        Ok(Chunk {
            id: row.get("id")?,
            doc_id: row.get("doc_id")?,
            content: row.get("content")?,
            source: row.get("source")?,
            page: row.get("page")?,
            chunk_index: row.get("chunk_index")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("test.db"), 8).unwrap();
        (store, dir)
    }

    fn chunk(content: &str, page: u32, idx: usize) -> NewChunk {
        NewChunk {
            content: content.to_string(),
            source: "coping.pdf".to_string(),
            page,
            chunk_index: idx,
        }
    }

    fn unit(i: usize) -> Array1<f32> {
        let mut v = Array1::zeros(8);
        v[i] = 1.0;
        v
    }

    #[test]
    fn test_duplicate_content_hash() {
        let (store, _dir) = test_store();
        store.add_document("a.pdf", 3, Some("same")).unwrap();
        let result = store.add_document("b.pdf", 3, Some("same"));
        assert!(matches!(result, Err(Error::DuplicateContent(_))));
        assert!(store.find_document_by_hash("same").unwrap().is_some());
    }

    #[test]
    fn test_chunks_keep_source_and_page() {
        let (store, _dir) = test_store();
        let doc_id = store.add_document("coping.pdf", 2, Some("h1")).unwrap();
        let ids = store
            .add_chunks(doc_id, &[chunk("Breathing exercises", 1, 0), chunk("Grounding", 2, 1)])
            .unwrap();
        assert_eq!(ids.len(), 2);

        let stored = store.get_chunks_for_document(doc_id).unwrap();
        assert_eq!(stored[1].content, "Grounding");
        assert_eq!(stored[1].page, 2);
        assert_eq!(stored[1].source, "coping.pdf");
    }

    #[test]
    fn test_bm25_search() {
        let (store, _dir) = test_store();
        let doc_id = store.add_document("coping.pdf", 1, None).unwrap();
        store
            .add_chunks(
                doc_id,
                &[
                    chunk("Deep breathing calms the nervous system during panic", 1, 0),
                    chunk("Journaling helps process difficult thoughts", 1, 1),
                ],
            )
            .unwrap();

        let hits = store.bm25_search("breathing \"panic", 5).unwrap();
        assert!(!hits.is_empty());
        assert!(hits[0].content.contains("breathing"));
        assert!(store.bm25_search("   ", 5).unwrap().is_empty());
    }

    #[test]
    fn test_vector_search_returns_all_top_k() {
        let (store, _dir) = test_store();
        let doc_id = store.add_document("coping.pdf", 1, None).unwrap();
        let ids = store
            .add_chunks(doc_id, &[chunk("one", 1, 0), chunk("two", 1, 1), chunk("three", 1, 2)])
            .unwrap();
        for (i, id) in ids.iter().enumerate() {
            store.add_chunk_embedding(*id, &unit(i)).unwrap();
        }

        let mut query = unit(1);
        query[0] = 0.2;
        let hits = store.vector_search(&query, 5).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].content, "two");
        assert_eq!(hits[1].content, "one");

        assert_eq!(store.vector_search(&query, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_embeddings_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("persist.db");
        {
            let store = SqliteStore::open(&path, 8).unwrap();
            let doc_id = store.add_document("coping.pdf", 1, None).unwrap();
            let ids = store.add_chunks(doc_id, &[chunk("kept", 1, 0)]).unwrap();
            store.add_chunk_embedding(ids[0], &unit(3)).unwrap();
        }
        let store = SqliteStore::open(&path, 8).unwrap();
        let hits = store.vector_search(&unit(3), 1).unwrap();
        assert_eq!(hits[0].content, "kept");
        assert!(hits[0].score > 0.99);
    }

    #[test]
    fn test_embedding_dimension_mismatch() {
        let (store, _dir) = test_store();
        let result = store.add_chunk_embedding(1, &Array1::zeros(3));
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[test]
    fn test_stats() {
        let (store, _dir) = test_store();
        let doc_id = store.add_document("coping.pdf", 1, None).unwrap();
        let ids = store.add_chunks(doc_id, &[chunk("x", 1, 0)]).unwrap();
        store.add_chunk_embedding(ids[0], &unit(0)).unwrap();

        let stats = store.get_stats().unwrap();
        assert_eq!(stats.total_documents, 1);
        assert_eq!(stats.total_chunks, 1);
        assert_eq!(stats.embeddings_stored, 1);
        assert_eq!(stats.embedding_dimension, 8);
        assert_eq!(stats.user_profiles, 0);
    }

    #[test]
    fn test_document_with_chunks_is_atomic() {
        let (store, _dir) = test_store();
        store.add_document("a.pdf", 1, Some("dup")).unwrap();

        let result = store.add_document_with_chunks("b.pdf", 1, Some("dup"), &[chunk("lost", 1, 0)]);
        assert!(matches!(result, Err(Error::DuplicateContent(_))));
        assert_eq!(store.count_chunks().unwrap(), 0);

        let (doc_id, ids) = store
            .add_document_with_chunks("c.pdf", 1, Some("fresh"), &[chunk("kept", 1, 0)])
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.get_chunks_for_document(doc_id).unwrap()[0].content, "kept");
    }

    #[test]
    fn test_delete_document_cascades() {
        let (store, _dir) = test_store();
        let (doc_id, ids) = store
            .add_document_with_chunks("coping.pdf", 1, Some("h"), &[chunk("breathing basics", 1, 0)])
            .unwrap();
        store.add_chunk_embedding(ids[0], &unit(2)).unwrap();

        assert!(store.delete_document(doc_id).unwrap());
        assert!(!store.delete_document(doc_id).unwrap());
        assert_eq!(store.count_chunks().unwrap(), 0);
        assert!(store.find_document_by_hash("h").unwrap().is_none());
        assert!(store.bm25_search("breathing", 5).unwrap().is_empty());
        assert!(store.vector_search(&unit(2), 5).unwrap().is_empty());
        assert_eq!(store.get_stats().unwrap().embeddings_stored, 0);
    }
}
