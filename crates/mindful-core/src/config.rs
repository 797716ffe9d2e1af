//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Collection name used when `MINDFUL_COLLECTION` is unset.
pub const DEFAULT_COLLECTION: &str = "my_collection";
/// Number of chunks retrieved for a grounded answer.
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_PORT: u16 = 5000;

/// Paths to all Mindful data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Vector index directory (`data/vectordb/`).
    pub vectordb: PathBuf,
    /// Source folder for PDF ingestion (`data/pdfs/`).
    pub pdfs: PathBuf,
    /// ONNX embedding model files (`data/models/`).
    pub models: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            vectordb: root.join("vectordb"),
            pdfs: root.join("pdfs"),
            models: root.join("models"),
            llm_config_file: root.join("llm-config.json"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.vectordb)?;
        std::fs::create_dir_all(&self.pdfs)?;
        std::fs::create_dir_all(&self.models)?;
        Ok(())
    }

    /// SQLite file backing the given collection.
    pub fn collection_db(&self, collection: &str) -> PathBuf {
        self.vectordb.join(format!("{}.db", collection))
    }
}

/// Top-level Mindful configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindfulConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Vector index collection name.
    pub collection: String,
    /// Chunks retrieved per grounded answer.
    pub top_k: usize,
    /// Embedding dimension (384 for all-MiniLM-L6-v2).
    pub embedding_dim: usize,
}

impl MindfulConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = env_parse("PORT").unwrap_or(DEFAULT_PORT);
        let top_k = env_parse("MINDFUL_TOP_K")
            .filter(|k: &usize| *k > 0)
            .unwrap_or(DEFAULT_TOP_K);
        let collection = std::env::var("MINDFUL_COLLECTION")
            .ok()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            collection,
            top_k,
            embedding_dim: 384,
        })
    }

    /// Path of the SQLite file for the configured collection.
    pub fn index_path(&self) -> PathBuf {
        self.data_paths.collection_db(&self.collection)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_create_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        assert!(paths.vectordb.is_dir());
        assert!(paths.pdfs.is_dir());
        assert!(paths.models.is_dir());
        assert_eq!(
            paths.collection_db("my_collection"),
            dir.path().join("vectordb").join("my_collection.db")
        );
    }
}
