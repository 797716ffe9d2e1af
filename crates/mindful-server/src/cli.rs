//! `mindful ingest`: index a folder of PDFs and summarise the result.

use std::path::Path;

use mindful_core::{MindfulConfig, Result};
use mindful_ingest::{IngestReport, Ingester};
use mindful_store::{SqliteStore, StoreStats};

/// Ingest every PDF in `dir` into the configured collection.
/// Returns the run's totals and the index totals afterwards.
pub fn ingest(config: &MindfulConfig, dir: &Path) -> Result<(IngestReport, StoreStats)> {
    let store = SqliteStore::open(config.index_path(), config.embedding_dim)?;
    let embedder = mindful_infer::create_embedder(&config.data_paths.models);

    let report = Ingester::new(&store, embedder.as_ref()).ingest_folder(dir)?;
    let stats = store.get_stats()?;
    Ok((report, stats))
}

pub fn render_summary(dir: &Path, report: &IngestReport, stats: &StoreStats) -> String {
    let mut out = format!("Ingested {}\n", dir.display());
    out.push_str(&format!("  files:      {}\n", report.files));
    out.push_str(&format!("  pages:      {}\n", report.pages));
    out.push_str(&format!("  chunks:     {}\n", report.chunks));
    out.push_str(&format!("  embedded:   {}\n", report.embedded));
    out.push_str(&format!("  duplicates: {}\n", report.duplicates));
    out.push_str(&format!("  failed:     {}\n", report.failed));
    out.push_str(&format!(
        "Index {} ({:.2} MB): {} documents, {} chunks, {} embeddings (dim {}), {} profiles\n",
        stats.db_path,
        stats.db_size_mb,
        stats.total_documents,
        stats.total_chunks,
        stats.embeddings_stored,
        stats.embedding_dimension,
        stats.user_profiles,
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_reports_index_totals() {
        let data = tempfile::tempdir().unwrap();
        let config = MindfulConfig::from_env(data.path()).unwrap();
        std::fs::write(config.data_paths.pdfs.join("broken.pdf"), b"not a pdf").unwrap();

        let (report, stats) = ingest(&config, &config.data_paths.pdfs).unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(stats.total_documents, 0);
        assert_eq!(stats.embedding_dimension, config.embedding_dim);

        let summary = render_summary(&config.data_paths.pdfs, &report, &stats);
        assert!(summary.contains("  failed:     1\n"));
        assert!(summary.contains("0 documents, 0 chunks, 0 embeddings (dim 384), 0 profiles"));
        assert!(summary.contains("my_collection.db"));
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let data = tempfile::tempdir().unwrap();
        let config = MindfulConfig::from_env(data.path()).unwrap();
        assert!(ingest(&config, &data.path().join("absent")).is_err());
    }
}
