//! Mindful Infer: text embeddings for the chunk index.
//!
//! With the `onnx` feature and model files in place, `OnnxEmbedder` runs
//! all-MiniLM-L6-v2 (384-dim). Otherwise `NoopEmbedder` is used and
//! retrieval falls back to keyword search.

pub mod cache;
pub mod embedder;
pub mod onnx_embedder;

pub use cache::QueryCache;
pub use embedder::{EmbedderBackend, EmbeddingResult, NoopEmbedder};

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use std::path::Path;
use std::sync::Arc;

/// Dimension of all-MiniLM-L6-v2 sentence embeddings.
pub const MINILM_DIM: usize = 384;

/// Create the best available embedder for the given model directory.
pub fn create_embedder(model_dir: &Path) -> Arc<dyn EmbedderBackend> {
    #[cfg(feature = "onnx")]
    {
        match OnnxEmbedder::load(model_dir) {
            Ok(embedder) => {
                tracing::info!("Using ONNX embedder (dim={})", embedder.dimension());
                return Arc::new(embedder);
            }
            Err(e) => {
                tracing::warn!("ONNX embedder unavailable: {}. Retrieval will use keyword search.", e);
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    {
        tracing::info!(
            "ONNX feature disabled, ignoring {}. Retrieval will use keyword search.",
            model_dir.display()
        );
    }

    Arc::new(NoopEmbedder::new(MINILM_DIM))
}
