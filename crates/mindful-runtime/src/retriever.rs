//! Passage retrieval for grounded answers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use mindful_core::{Error, Result};
use mindful_infer::EmbedderBackend;
use mindful_store::{SearchHit, SqliteStore};

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `top_k` passages nearest to `query`, best first.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>>;
}

/// Searches the chunk index: cosine similarity when an embedding model is
/// loaded, FTS5 BM25 otherwise or when no chunk has a vector yet. No score
/// threshold is applied.
pub struct IndexRetriever {
    store: Arc<SqliteStore>,
    embedder: Arc<dyn EmbedderBackend>,
}

impl IndexRetriever {
    pub fn new(store: Arc<SqliteStore>, embedder: Arc<dyn EmbedderBackend>) -> Self {
        Self { store, embedder }
    }

    fn search_blocking(
        store: &SqliteStore,
        embedder: &dyn EmbedderBackend,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        if embedder.is_available() {
            if let Some(result) = embedder.embed(query) {
                let hits = store.vector_search(&result.embedding, top_k)?;
                debug!("Vector search: {} hits (cached query: {})", hits.len(), result.cached);
                if !hits.is_empty() {
                    return Ok(hits);
                }
                // Chunks ingested before the model was installed have no vectors.
                debug!("No vector hits, using keyword search");
            } else {
                warn!("Query embedding failed, using keyword search");
            }
        }
        let hits = store.bm25_search(query, top_k)?;
        debug!("Keyword search: {} hits", hits.len());
        Ok(hits)
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let store = self.store.clone();
        let embedder = self.embedder.clone();
        let query = query.to_string();
        tokio::task::spawn_blocking(move || {
            Self::search_blocking(&store, embedder.as_ref(), &query, top_k)
        })
        .await
        .map_err(|e| Error::Search(format!("Retrieval task failed: {}", e)))?
    }
}

/// Passage contents separated by blank lines, in rank order.
pub fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| h.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindful_infer::{EmbeddingResult, NoopEmbedder};
    use mindful_store::NewChunk;
    use ndarray::Array1;

    /// Maps known words onto fixed axes.
    struct AxisEmbedder;

    impl EmbedderBackend for AxisEmbedder {
        fn embed(&self, text: &str) -> Option<EmbeddingResult> {
            let mut v = Array1::<f32>::zeros(4);
            for (i, word) in ["sleep", "panic", "grief", "work"].iter().enumerate() {
                if text.to_lowercase().contains(word) {
                    v[i] = 1.0;
                }
            }
            Some(EmbeddingResult { embedding: v, cached: false })
        }

        fn dimension(&self) -> usize {
            4
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn seeded_store(dir: &tempfile::TempDir, embedder: &dyn EmbedderBackend) -> Arc<SqliteStore> {
        let store = SqliteStore::open(dir.path().join("idx.db"), 4).unwrap();
        let doc = store.add_document("guide.pdf", 1, None).unwrap();
        let texts = ["Sleep hygiene basics", "Panic attack grounding", "Coping with grief"];
        let chunks: Vec<NewChunk> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| NewChunk {
                content: t.to_string(),
                source: "guide.pdf".into(),
                page: 1,
                chunk_index: i,
            })
            .collect();
        let ids = store.add_chunks(doc, &chunks).unwrap();
        for (id, t) in ids.iter().zip(texts) {
            if let Some(r) = embedder.embed(t) {
                store.add_chunk_embedding(*id, &r.embedding).unwrap();
            }
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_vector_retrieval() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir, &AxisEmbedder);
        let retriever = IndexRetriever::new(store, Arc::new(AxisEmbedder));
        let hits = retriever.retrieve("I can't sleep at night", 5).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].content, "Sleep hygiene basics");
    }

    #[tokio::test]
    async fn test_keyword_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir, &NoopEmbedder::new(4));
        let retriever = IndexRetriever::new(store, Arc::new(NoopEmbedder::new(4)));
        let hits = retriever.retrieve("grief", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "Coping with grief");
    }

    #[tokio::test]
    async fn test_unembedded_index_falls_back_to_keywords() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir, &NoopEmbedder::new(4));
        let retriever = IndexRetriever::new(store, Arc::new(AxisEmbedder));
        let hits = retriever.retrieve("grief", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "Coping with grief");
    }

    #[test]
    fn test_format_context_joins_with_blank_line() {
        let hit = |c: &str| SearchHit {
            chunk_id: 1,
            content: c.into(),
            source: "a.pdf".into(),
            page: 1,
            score: 0.0,
        };
        assert_eq!(format_context(&[hit("one"), hit("one"), hit("two")]), "one\n\none\n\ntwo");
        assert_eq!(format_context(&[]), "");
    }
}
