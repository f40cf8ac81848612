use std::collections::HashMap;

use crate::errors::ScholarResult;
use crate::models::Chunk;

/// Bi-encoder: text → fixed-dimension unit-norm vector.
pub trait Embedder: Send + Sync {
    /// Embed a single text. Deterministic for the same input; output is
    /// L2-normalized.
    fn embed(&self, text: &str) -> ScholarResult<Vec<f32>>;

    /// Embed a batch of texts.
    fn embed_batch(&self, texts: &[String]) -> ScholarResult<Vec<Vec<f32>>>;

    /// The fixed dimensionality of produced vectors.
    fn dimensions(&self) -> usize;

    /// Human-readable model name.
    fn name(&self) -> &str;
}

/// Pairwise (query, document) relevance scorer.
///
/// Scores are monotone in predicted relevance but not calibrated; callers
/// use them only to sort.
pub trait PairScorer: Send + Sync {
    /// Score each document against the query. Returns chunk_id → score.
    fn score(&self, query: &str, docs: &[Chunk]) -> ScholarResult<HashMap<String, f32>>;
}

/// Subword token counting for prompt budgeting.
///
/// Backed by the embedder's tokenizer when a model is loaded; the prompt
/// assembler falls back to whitespace counting otherwise.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

/// Whitespace approximation, the fallback counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceCounter;

impl TokenCounter for WhitespaceCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}
