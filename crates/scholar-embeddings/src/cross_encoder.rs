//! Pairwise (query, document) relevance scoring.
//!
//! When an ONNX pair-encoder is present in the configured directory it is
//! used directly: each pair is tokenized with separators and type ids,
//! padded to the batch max, and the first logit is the relevance score.
//! Without a pair model the scorer degrades to bi-encoder cosine.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::{info, warn};

use scholar_core::constants::CROSS_ENCODER_MAX_SEQ_LEN;
use scholar_core::errors::{EmbeddingError, ScholarResult};
use scholar_core::models::Chunk;
use scholar_core::traits::{Embedder, PairScorer};

struct PairModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

/// Cross-encoder with bi-encoder cosine fallback.
pub struct CrossEncoderScorer {
    model: Option<PairModel>,
    fallback: Arc<dyn Embedder>,
}

// Safety: Session is Send but not Sync by default. The Mutex provides Sync.
unsafe impl Sync for CrossEncoderScorer {}

impl CrossEncoderScorer {
    /// Try to load a pair-encoder from `dir`; fall back to cosine scoring
    /// with `fallback` when `dir/model.onnx` is absent or unloadable.
    pub fn load(dir: &str, fallback: Arc<dyn Embedder>) -> Self {
        let model = match Self::try_load_model(dir) {
            Ok(m) => {
                info!(dir, "cross-encoder model loaded");
                Some(m)
            }
            Err(e) => {
                warn!(dir, error = %e, "no cross-encoder model, using bi-encoder fallback");
                None
            }
        };
        CrossEncoderScorer { model, fallback }
    }

    /// Whether the ONNX pair model is active (as opposed to the fallback).
    pub fn has_pair_model(&self) -> bool {
        self.model.is_some()
    }

    fn try_load_model(dir: &str) -> ScholarResult<PairModel> {
        let model_path = Path::new(dir).join("model.onnx");
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
        let tokenizer_path = Path::new(dir).join("tokenizer.json");
        let tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| EmbeddingError::ModelLoadFailed {
                path: tokenizer_path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(PairModel {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn score_with_model(
        &self,
        model: &PairModel,
        query: &str,
        docs: &[Chunk],
    ) -> ScholarResult<HashMap<String, f32>> {
        let infer_err = |reason: String| EmbeddingError::InferenceFailed { reason };

        // Tokenize each (query, doc) pair: [CLS] query [SEP] doc [SEP].
        let mut rows: Vec<(Vec<i64>, Vec<i64>, Vec<i64>)> = Vec::with_capacity(docs.len());
        let mut max_len = 0usize;
        for doc in docs {
            let encoding = model
                .tokenizer
                .encode((query, doc.text.as_str()), true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;
            let take = encoding.get_ids().len().min(CROSS_ENCODER_MAX_SEQ_LEN);
            let ids: Vec<i64> = encoding.get_ids()[..take].iter().map(|&v| v as i64).collect();
            let mask: Vec<i64> = encoding.get_attention_mask()[..take]
                .iter()
                .map(|&v| v as i64)
                .collect();
            let type_ids: Vec<i64> = encoding.get_type_ids()[..take]
                .iter()
                .map(|&v| v as i64)
                .collect();
            max_len = max_len.max(ids.len());
            rows.push((ids, mask, type_ids));
        }

        let batch = rows.len();
        let mut flat_ids = Vec::with_capacity(batch * max_len);
        let mut flat_mask = Vec::with_capacity(batch * max_len);
        let mut flat_types = Vec::with_capacity(batch * max_len);
        for (ids, mask, type_ids) in &rows {
            flat_ids.extend_from_slice(ids);
            flat_mask.extend_from_slice(mask);
            flat_types.extend_from_slice(type_ids);
            for _ in ids.len()..max_len {
                flat_ids.push(0);
                flat_mask.push(0);
                flat_types.push(0);
            }
        }

        let shape = vec![batch as i64, max_len as i64];
        let ids_tensor = Tensor::from_array((shape.clone(), flat_ids))
            .map_err(|e| infer_err(format!("tensor creation error: {e}")))?;
        let mask_tensor = Tensor::from_array((shape.clone(), flat_mask))
            .map_err(|e| infer_err(format!("tensor creation error: {e}")))?;
        let types_tensor = Tensor::from_array((shape, flat_types))
            .map_err(|e| infer_err(format!("tensor creation error: {e}")))?;

        let mut session = model
            .session
            .lock()
            .map_err(|e| infer_err(format!("session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![ids_tensor, mask_tensor, types_tensor])
            .map_err(|e| infer_err(e.to_string()))?;

        let (_name, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| infer_err("no output tensor".to_string()))?;
        let (out_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| infer_err(format!("tensor extraction failed: {e}")))?;

        // Logits arrive as [batch, num_labels] or flat [batch]; the first
        // logit per sample is the relevance score.
        let stride = if out_shape.len() == 2 {
            out_shape[1] as usize
        } else {
            1
        };
        let mut scores = HashMap::with_capacity(batch);
        for (i, doc) in docs.iter().enumerate() {
            let score = data
                .get(i * stride)
                .copied()
                .ok_or_else(|| infer_err(format!("missing logit for row {i}")))?;
            scores.insert(doc.chunk_id.clone(), score);
        }
        Ok(scores)
    }

    fn score_with_fallback(
        &self,
        query: &str,
        docs: &[Chunk],
    ) -> ScholarResult<HashMap<String, f32>> {
        let qv = self.fallback.embed(query)?;
        let mut out = HashMap::with_capacity(docs.len());
        for doc in docs {
            let dv = self.fallback.embed(&doc.text)?;
            out.insert(doc.chunk_id.clone(), cosine(&qv, &dv) as f32);
        }
        Ok(out)
    }
}

impl PairScorer for CrossEncoderScorer {
    fn score(&self, query: &str, docs: &[Chunk]) -> ScholarResult<HashMap<String, f32>> {
        if docs.is_empty() {
            return Ok(HashMap::new());
        }
        match &self.model {
            Some(model) => self.score_with_model(model, query, docs),
            None => self.score_with_fallback(query, docs),
        }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        dot += (*x as f64) * (*y as f64);
        na += (*x as f64) * (*x as f64);
        nb += (*y as f64) * (*y as f64);
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}
