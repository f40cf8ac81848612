//! Bi-encoder over ONNX Runtime.
//!
//! Loads a sentence-transformer exported to ONNX plus its WordPiece
//! tokenizer, runs padded batch inference, and L2-normalizes the output.
//! Handles both pooled (`[batch, dims]`) and per-token
//! (`[batch, seq, dims]`) model outputs.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use scholar_core::errors::{EmbeddingError, ScholarResult};
use scholar_core::traits::{Embedder, TokenCounter};

use crate::pooling::{l2_normalize, mean_pool, pad_batch};

/// ONNX bi-encoder producing unit-norm vectors of a fixed dimension.
pub struct OnnxEmbedder {
    /// `run` needs `&mut Session`; the mutex satisfies the `&self` trait.
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    max_seq_len: usize,
    dimensions: usize,
    model_name: String,
}

// Safety: Session is Send but not Sync by default. The Mutex provides Sync.
unsafe impl Sync for OnnxEmbedder {}

impl OnnxEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn load(model_dir: &str, max_seq_len: usize, dimensions: usize) -> ScholarResult<Self> {
        let dir = Path::new(model_dir);
        let model_path = dir.join("model.onnx");
        if !model_path.exists() {
            return Err(EmbeddingError::ModelLoadFailed {
                path: model_path.display().to_string(),
                reason: "model file not found".to_string(),
            }
            .into());
        }

        let load_err = |reason: String| EmbeddingError::ModelLoadFailed {
            path: model_path.display().to_string(),
            reason,
        };

        let session = Session::builder()
            .map_err(|e| load_err(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e| load_err(e.to_string()))?
            .commit_from_file(&model_path)
            .map_err(|e| load_err(e.to_string()))?;

        let tokenizer_path = dir.join("tokenizer.json");
        let tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| EmbeddingError::ModelLoadFailed {
                path: tokenizer_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let model_name = dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx-bi-encoder")
            .to_string();

        debug!(model = %model_name, dims = dimensions, max_seq_len, "bi-encoder loaded");

        Ok(OnnxEmbedder {
            session: Mutex::new(session),
            tokenizer,
            max_seq_len,
            dimensions,
            model_name,
        })
    }

    /// Tokenize with special tokens, truncated to `max_seq_len`.
    fn tokenize(&self, text: &str) -> ScholarResult<(Vec<i64>, Vec<i64>)> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: e.to_string(),
            })?;
        let ids: Vec<i64> = encoding
            .get_ids()
            .iter()
            .take(self.max_seq_len)
            .map(|&id| id as i64)
            .collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .take(self.max_seq_len)
            .map(|&m| m as i64)
            .collect();
        Ok((ids, mask))
    }

    fn infer_batch(&self, texts: &[String]) -> ScholarResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let tokenized: Vec<(Vec<i64>, Vec<i64>)> = texts
            .iter()
            .map(|t| self.tokenize(t))
            .collect::<ScholarResult<_>>()?;
        let valid_lens: Vec<usize> = tokenized.iter().map(|(ids, _)| ids.len()).collect();
        let (flat_ids, flat_mask, max_len) = pad_batch(&tokenized);
        let batch = texts.len();
        let shape = vec![batch as i64, max_len as i64];

        let infer_err = |reason: String| EmbeddingError::InferenceFailed { reason };

        let ids_tensor = Tensor::from_array((shape.clone(), flat_ids))
            .map_err(|e| infer_err(format!("tensor creation error: {e}")))?;
        let mask_tensor = Tensor::from_array((shape, flat_mask))
            .map_err(|e| infer_err(format!("tensor creation error: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| infer_err(format!("session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs![ids_tensor, mask_tensor])
            .map_err(|e| infer_err(e.to_string()))?;

        let (_name, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| infer_err("no output tensor".to_string()))?;

        let (out_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| infer_err(format!("tensor extraction failed: {e}")))?;

        let mut results = Vec::with_capacity(batch);
        if out_shape.len() == 3 {
            // [batch, seq, dims]: mean-pool over non-padded tokens.
            let seq = out_shape[1] as usize;
            let dims = out_shape[2] as usize;
            for (b, &valid) in valid_lens.iter().enumerate() {
                let sample = &data[b * seq * dims..(b + 1) * seq * dims];
                let mut pooled = mean_pool(sample, seq, dims, valid);
                l2_normalize(&mut pooled);
                results.push(pooled);
            }
        } else if out_shape.len() == 2 {
            // [batch, dims]: the model pooled for us.
            let dims = out_shape[1] as usize;
            for b in 0..batch {
                let mut v = data[b * dims..(b + 1) * dims].to_vec();
                l2_normalize(&mut v);
                results.push(v);
            }
        } else {
            return Err(infer_err(format!("unexpected output shape: {out_shape:?}")).into());
        }

        for v in &results {
            if v.len() != self.dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: v.len(),
                }
                .into());
            }
        }

        Ok(results)
    }
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> ScholarResult<Vec<f32>> {
        let texts = [text.to_string()];
        self.infer_batch(&texts)?.into_iter().next().ok_or_else(|| {
            EmbeddingError::InferenceFailed {
                reason: "empty inference result".to_string(),
            }
            .into()
        })
    }

    fn embed_batch(&self, texts: &[String]) -> ScholarResult<Vec<Vec<f32>>> {
        self.infer_batch(texts)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

impl TokenCounter for OnnxEmbedder {
    fn count_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        // Uncapped count: the prompt budget cares about real length, not
        // the model's sequence limit.
        match self.tokenizer.encode(text, true) {
            Ok(encoding) => encoding.get_ids().len(),
            Err(_) => text.split_whitespace().count(),
        }
    }
}
