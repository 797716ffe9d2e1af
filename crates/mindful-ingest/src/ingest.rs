//! Ingestion pipeline: PDF folder → pages → chunks → store (+ embeddings).

use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::chunking::RecursiveChunker;
use crate::pdf::{self, PdfPage, PdfText};
use mindful_core::{Error, Result};
use mindful_infer::EmbedderBackend;
use mindful_store::{NewChunk, SqliteStore};

/// Totals for one ingestion run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct IngestReport {
    pub files: usize,
    pub pages: usize,
    pub chunks: usize,
    pub embedded: usize,
    /// Files skipped because identical content was already ingested.
    pub duplicates: usize,
    /// Files that could not be read or parsed.
    pub failed: usize,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Ingested { doc_id: i64, pages: usize, chunks: usize, embedded: usize },
    Duplicate,
}

pub struct Ingester<'a> {
    store: &'a SqliteStore,
    embedder: &'a dyn EmbedderBackend,
    chunker: RecursiveChunker,
}

impl<'a> Ingester<'a> {
    pub fn new(store: &'a SqliteStore, embedder: &'a dyn EmbedderBackend) -> Self {
        Self {
            store,
            embedder,
            chunker: RecursiveChunker::default(),
        }
    }

    pub fn with_chunker(mut self, chunker: RecursiveChunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Ingest every PDF directly inside `dir`. A file that fails to parse
    /// is logged and counted; it does not abort the run.
    pub fn ingest_folder(&self, dir: &Path) -> Result<IngestReport> {
        let files = pdf::list_pdfs(dir)?;
        info!("Ingesting {} PDF files from {}", files.len(), dir.display());

        let mut report = IngestReport::default();
        for path in &files {
            match self.ingest_pdf(path) {
                Ok(FileOutcome::Ingested { pages, chunks, embedded, .. }) => {
                    report.files += 1;
                    report.pages += pages;
                    report.chunks += chunks;
                    report.embedded += embedded;
                }
                Ok(FileOutcome::Duplicate) => report.duplicates += 1,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Ingestion complete: {} files, {} pages, {} chunks ({} embedded), {} duplicates, {} failed",
            report.files, report.pages, report.chunks, report.embedded, report.duplicates, report.failed
        );
        Ok(report)
    }

    pub fn ingest_pdf(&self, path: &Path) -> Result<FileOutcome> {
        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.pdf")
            .to_string();
        let loaded = PdfText::load(path)?;
        let hash = content_hash(&loaded.bytes);
        self.ingest_pages(&source, &hash, &loaded.pages)
    }

    /// Chunk and store already-extracted pages under `source`.
    pub fn ingest_pages(&self, source: &str, hash: &str, pages: &[PdfPage]) -> Result<FileOutcome> {
        if self.store.find_document_by_hash(hash)?.is_some() {
            debug!("Duplicate content, skipping: {}", source);
            return Ok(FileOutcome::Duplicate);
        }

        let chunks = self.chunk_pages(source, pages);
        let (doc_id, chunk_ids) =
            match self.store.add_document_with_chunks(source, pages.len(), Some(hash), &chunks) {
                Ok(ids) => ids,
                Err(Error::DuplicateContent(_)) => return Ok(FileOutcome::Duplicate),
                Err(e) => return Err(e),
            };

        // A half-embedded document would be skipped as a duplicate on rerun.
        let embedded = match self.embed_chunks(&chunk_ids, &chunks) {
            Ok(n) => n,
            Err(e) => {
                self.store.delete_document(doc_id)?;
                return Err(e);
            }
        };

        info!(
            "Ingested {} as document {}: {} pages, {} chunks",
            source,
            doc_id,
            pages.len(),
            chunks.len()
        );
        Ok(FileOutcome::Ingested {
            doc_id,
            pages: pages.len(),
            chunks: chunks.len(),
            embedded,
        })
    }

    fn chunk_pages(&self, source: &str, pages: &[PdfPage]) -> Vec<NewChunk> {
        let mut chunks = Vec::new();
        for page in pages {
            for content in self.chunker.split(&page.text) {
                chunks.push(NewChunk {
                    content,
                    source: source.to_string(),
                    page: page.number,
                    chunk_index: chunks.len(),
                });
            }
        }
        chunks
    }

    fn embed_chunks(&self, ids: &[i64], chunks: &[NewChunk]) -> Result<usize> {
        if !self.embedder.is_available() || chunks.is_empty() {
            return Ok(0);
        }
        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let mut embedded = 0;
        for (id, result) in ids.iter().zip(self.embedder.embed_batch(&texts)) {
            match result {
                Some(r) => {
                    self.store.add_chunk_embedding(*id, &r.embedding)?;
                    embedded += 1;
                }
                None => warn!("No embedding produced for chunk {}", id),
            }
        }
        Ok(embedded)
    }
}

/// SHA-256 of a file's bytes, hex encoded.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindful_infer::{EmbeddingResult, NoopEmbedder};
    use ndarray::Array1;

    /// Deterministic 8-dim embedding from byte sums.
    struct ByteEmbedder;

    impl EmbedderBackend for ByteEmbedder {
        fn embed(&self, text: &str) -> Option<EmbeddingResult> {
            let mut v = Array1::<f32>::zeros(8);
            for (i, b) in text.bytes().enumerate() {
                v[i % 8] += b as f32;
            }
            Some(EmbeddingResult { embedding: v, cached: false })
        }

        fn dimension(&self) -> usize {
            8
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    /// Produces vectors of the wrong width, so every store write fails.
    struct MisfitEmbedder;

    impl EmbedderBackend for MisfitEmbedder {
        fn embed(&self, _text: &str) -> Option<EmbeddingResult> {
            Some(EmbeddingResult { embedding: Array1::zeros(3), cached: false })
        }

        fn dimension(&self) -> usize {
            3
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn pages() -> Vec<PdfPage> {
        vec![
            PdfPage { number: 1, text: "Anxiety is a normal response to stress.".into() },
            PdfPage { number: 2, text: String::new() },
            PdfPage { number: 3, text: "Try box breathing.\n\nName five things you can see.".into() },
        ]
    }

    fn store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("my_collection.db"), 8).unwrap();
        (store, dir)
    }

    #[test]
    fn test_chunks_tagged_with_source_and_page() {
        let (store, _dir) = store();
        let embedder = NoopEmbedder::new(8);
        let ingester = Ingester::new(&store, &embedder);

        let outcome = ingester.ingest_pages("coping.pdf", "h1", &pages()).unwrap();
        let FileOutcome::Ingested { doc_id, pages, chunks, embedded } = outcome else {
            panic!("expected ingestion");
        };
        assert_eq!((pages, chunks, embedded), (3, 2, 0));

        let stored = store.get_chunks_for_document(doc_id).unwrap();
        assert_eq!(stored[0].page, 1);
        assert_eq!(stored[1].page, 3);
        assert!(stored.iter().all(|c| c.source == "coping.pdf"));
        assert_eq!(stored[1].chunk_index, 1);
    }

    #[test]
    fn test_duplicate_file_skipped() {
        let (store, _dir) = store();
        let embedder = NoopEmbedder::new(8);
        let ingester = Ingester::new(&store, &embedder);

        ingester.ingest_pages("a.pdf", "same", &pages()).unwrap();
        let again = ingester.ingest_pages("copy-of-a.pdf", "same", &pages()).unwrap();
        assert_eq!(again, FileOutcome::Duplicate);
        assert_eq!(store.count_documents().unwrap(), 1);
    }

    #[test]
    fn test_embeddings_stored_when_available() {
        let (store, _dir) = store();
        let ingester = Ingester::new(&store, &ByteEmbedder)
            .with_chunker(RecursiveChunker::new(30, 5));

        let outcome = ingester.ingest_pages("coping.pdf", "h2", &pages()).unwrap();
        let FileOutcome::Ingested { chunks, embedded, .. } = outcome else {
            panic!("expected ingestion");
        };
        assert!(chunks > 2);
        assert_eq!(embedded, chunks);
        assert_eq!(store.get_stats().unwrap().embeddings_stored as usize, chunks);
    }

    #[test]
    fn test_folder_counts_failures() {
        let (store, _dir) = store();
        let embedder = NoopEmbedder::new(8);
        let pdfs = tempfile::tempdir().unwrap();
        std::fs::write(pdfs.path().join("broken.pdf"), b"garbage").unwrap();

        let report = Ingester::new(&store, &embedder).ingest_folder(pdfs.path()).unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.files, 0);
    }

    #[test]
    fn test_content_hash_stable() {
        assert_eq!(content_hash(b"abc"), content_hash(b"abc"));
        assert_ne!(content_hash(b"abc"), content_hash(b"abd"));
        assert_eq!(content_hash(b"").len(), 64);
    }

    #[test]
    fn test_failed_embedding_leaves_file_retryable() {
        let (store, _dir) = store();

        let result = Ingester::new(&store, &MisfitEmbedder).ingest_pages("coping.pdf", "h3", &pages());
        assert!(matches!(result, Err(Error::Storage(_))));
        assert_eq!(store.count_documents().unwrap(), 0);
        assert_eq!(store.count_chunks().unwrap(), 0);

        let retry = Ingester::new(&store, &ByteEmbedder).ingest_pages("coping.pdf", "h3", &pages()).unwrap();
        assert!(matches!(retry, FileOutcome::Ingested { embedded: 2, .. }));
    }
}
