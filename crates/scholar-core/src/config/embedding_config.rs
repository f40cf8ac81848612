use serde::{Deserialize, Serialize};

use super::{env_or, env_or_str};
use crate::constants::{EMBEDDING_DIMENSIONS, EMBED_MAX_SEQ_LEN};

/// ONNX model locations and limits for the bi-encoder and cross-encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Directory holding `model.onnx` and `tokenizer.json`.
    pub model_dir: String,
    /// Cross-encoder directory; when `model.onnx` is absent the scorer
    /// falls back to bi-encoder cosine.
    pub cross_encoder_dir: String,
    pub max_seq_len: usize,
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig {
            model_dir: "models/all-mpnet-base-v2-onnx".to_string(),
            cross_encoder_dir: "models/cross-encoder-ms-marco-miniLM-L-6-v2".to_string(),
            max_seq_len: EMBED_MAX_SEQ_LEN,
            dimensions: EMBEDDING_DIMENSIONS,
        }
    }
}

impl EmbeddingConfig {
    pub fn from_env() -> Self {
        let d = EmbeddingConfig::default();
        EmbeddingConfig {
            model_dir: env_or_str("EMBED_MODEL_PATH", &d.model_dir),
            cross_encoder_dir: env_or_str("CROSS_ENCODER_PATH", &d.cross_encoder_dir),
            max_seq_len: env_or("EMBED_MAX_SEQ_LEN", d.max_seq_len),
            dimensions: env_or("EMBEDDING_DIM", d.dimensions),
        }
    }
}
