//! Mindful Ingest: PDF page extraction, overlapping chunking, folder ingestion.

pub mod chunking;
pub mod ingest;
pub mod pdf;

pub use chunking::{RecursiveChunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use ingest::{content_hash, IngestReport, Ingester};
pub use pdf::{PdfPage, PdfText};
