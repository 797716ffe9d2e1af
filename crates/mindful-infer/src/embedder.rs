//! Embedding backend trait.

use ndarray::Array1;

/// Result of an embedding operation.
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    pub embedding: Array1<f32>,
    /// Whether this was served from cache.
    pub cached: bool,
}

/// Anything that can turn text into a fixed-size vector.
pub trait EmbedderBackend: Send + Sync {
    /// Embed one text. `None` means the backend can't produce a vector.
    fn embed(&self, text: &str) -> Option<EmbeddingResult>;

    fn embed_batch(&self, texts: &[&str]) -> Vec<Option<EmbeddingResult>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize;

    /// Whether a model is loaded. Callers use keyword search when false.
    fn is_available(&self) -> bool;
}

/// Stand-in used when no model is loaded.
pub struct NoopEmbedder {
    dim: usize,
}

impl NoopEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl EmbedderBackend for NoopEmbedder {
    fn embed(&self, _text: &str) -> Option<EmbeddingResult> {
        None
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        false
    }
}
