//! int8 embedding quantization for the `chunk_embeddings` table.

use ndarray::Array1;

/// Quantize a float32 embedding to uint8 bytes with scale and offset.
///
/// Maps [min, max] → [0, 255] linearly; `original ≈ byte * scale + offset`.
pub fn quantize_uint8(embedding: &Array1<f32>) -> (Vec<u8>, f32, f32) {
    let (min_val, max_val) = embedding
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if embedding.is_empty() {
        return (Vec::new(), 0.0, 0.0);
    }
    if max_val - min_val < 1e-9 {
        return (vec![0u8; embedding.len()], 0.0, min_val);
    }

    let scale = (max_val - min_val) / 255.0;
    let bytes = embedding
        .iter()
        .map(|&v| ((v - min_val) / scale).round().clamp(0.0, 255.0) as u8)
        .collect();

    (bytes, scale, min_val)
}

/// Restore a float32 embedding from its quantized form.
pub fn dequantize_uint8(bytes: &[u8], scale: f32, offset: f32) -> Array1<f32> {
    bytes.iter().map(|&b| b as f32 * scale + offset).collect()
}

/// L2-normalize, returning `None` for a zero vector.
pub fn normalized(embedding: &Array1<f32>) -> Option<Array1<f32>> {
    let norm = embedding.dot(embedding).sqrt();
    if norm < 1e-9 {
        None
    } else {
        Some(embedding / norm)
    }
}
