//! Data types for documents, chunks, search hits and profiles.

use serde::{Deserialize, Serialize};

/// An ingested source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    /// Source filename, e.g. `anxiety-workbook.pdf`.
    pub source: String,
    pub page_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    pub created_at: i64,
}

/// A stored chunk. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: i64,
    pub doc_id: i64,
    pub content: String,
    pub source: String,
    pub page: i64,
    pub chunk_index: i64,
    pub created_at: i64,
}

/// Chunk content as produced by ingestion, before it gets an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChunk {
    pub content: String,
    pub source: String,
    pub page: u32,
    pub chunk_index: usize,
}

/// A similarity or keyword search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: i64,
    pub content: String,
    pub source: String,
    pub page: i64,
    pub score: f64,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_documents: i64,
    pub total_chunks: i64,
    pub embeddings_stored: i64,
    pub embedding_dimension: usize,
    pub user_profiles: i64,
    pub db_path: String,
    pub db_size_mb: f64,
}

/// A user profile document.
///
/// `fields` holds everything the client has set except `user_id`; the
/// store never interprets them.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub fields: serde_json::Map<String, serde_json::Value>,
    pub updated_at: i64,
}

impl UserProfile {
    /// The profile as returned to clients: `user_id` plus every stored field.
    pub fn to_document(&self) -> serde_json::Value {
        let mut doc = serde_json::Map::with_capacity(self.fields.len() + 1);
        doc.insert(
            "user_id".to_string(),
            serde_json::Value::String(self.user_id.clone()),
        );
        for (k, v) in &self.fields {
            doc.insert(k.clone(), v.clone());
        }
        serde_json::Value::Object(doc)
    }

    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }
}
