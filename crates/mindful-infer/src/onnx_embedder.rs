//! all-MiniLM-L6-v2 sentence embeddings through ONNX Runtime.
//!
//! Expects `model.onnx` and `tokenizer.json` in the model directory.
//! Requires the `onnx` feature; `ORT_DYLIB_PATH` must point at
//! libonnxruntime because `ort` is built with `load-dynamic`.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;

    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::{info, warn};

    use crate::cache::QueryCache;
    use crate::embedder::{EmbedderBackend, EmbeddingResult};
    use crate::MINILM_DIM;

    /// MiniLM was trained on 256 word pieces; longer input is truncated.
    const MAX_SEQ_LEN: usize = 256;

    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        cache: QueryCache,
    }

    struct Encoded {
        ids: Vec<i64>,
        mask: Vec<i64>,
    }

    impl OnnxEmbedder {
        pub fn load(model_dir: &Path) -> Result<Self, String> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");
            for required in [&model_path, &tokenizer_path] {
                if !required.exists() {
                    return Err(format!("Missing model file: {}", required.display()));
                }
            }

            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| format!("Failed to create session builder: {}", e))?
                .with_intra_threads(2)
                .map_err(|e| format!("Failed to set threads: {}", e))?
                .commit_from_file(&model_path)
                .map_err(|e| format!("Failed to load ONNX model: {}", e))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| format!("Failed to load tokenizer: {}", e))?;

            info!("ONNX embedder loaded from {}", model_dir.display());

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                cache: QueryCache::default_cache(),
            })
        }

        fn encode(&self, text: &str) -> Option<Encoded> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| warn!("Tokenization failed: {}", e))
                .ok()?;
            let len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            Some(Encoded {
                ids: encoding.get_ids()[..len].iter().map(|&v| v as i64).collect(),
                mask: encoding.get_attention_mask()[..len]
                    .iter()
                    .map(|&v| v as i64)
                    .collect(),
            })
        }

        fn run(&self, encoded: &Encoded) -> Option<Array1<f32>> {
            let seq_len = encoded.ids.len();
            let shape = [1usize, seq_len];
            let ids = Tensor::from_array((shape, encoded.ids.clone()))
                .map_err(|e| warn!("Failed to build input_ids: {}", e))
                .ok()?;
            let mask = Tensor::from_array((shape, encoded.mask.clone()))
                .map_err(|e| warn!("Failed to build attention_mask: {}", e))
                .ok()?;
            let type_ids = Tensor::from_array((shape, vec![0i64; seq_len]))
                .map_err(|e| warn!("Failed to build token_type_ids: {}", e))
                .ok()?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![ids, mask, type_ids])
                .map_err(|e| warn!("ONNX inference failed: {}", e))
                .ok()?;
            let (out_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| warn!("Failed to read output tensor: {}", e))
                .ok()?;
            let dims: Vec<i64> = out_shape.iter().copied().collect();

            match dims.as_slice() {
                // [1, seq_len, dim] token embeddings
                [_, _, dim] => mean_pool(data, &encoded.mask, *dim as usize),
                // [1, dim] already pooled
                [_, dim] => Some(Array1::from_vec(data[..*dim as usize].to_vec())),
                other => {
                    warn!("Unexpected output shape: {:?}", other);
                    None
                }
            }
        }
    }

    fn mean_pool(data: &[f32], mask: &[i64], dim: usize) -> Option<Array1<f32>> {
        let mut pooled = Array1::<f32>::zeros(dim);
        let mut kept = 0f32;
        for (i, _) in mask.iter().enumerate().filter(|(_, &m)| m > 0) {
            let row = &data[i * dim..(i + 1) * dim];
            for (acc, v) in pooled.iter_mut().zip(row) {
                *acc += v;
            }
            kept += 1.0;
        }
        if kept == 0.0 {
            return None;
        }
        Some(pooled / kept)
    }

    impl EmbedderBackend for OnnxEmbedder {
        fn embed(&self, text: &str) -> Option<EmbeddingResult> {
            if let Some(embedding) = self.cache.get(text) {
                return Some(EmbeddingResult {
                    embedding,
                    cached: true,
                });
            }
            let embedding = self.run(&self.encode(text)?)?;
            self.cache.put(text.to_string(), embedding.clone());
            Some(EmbeddingResult {
                embedding,
                cached: false,
            })
        }

        fn dimension(&self) -> usize {
            MINILM_DIM
        }

        fn is_available(&self) -> bool {
            true
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;
