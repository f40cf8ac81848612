use std::collections::HashMap;

use crate::errors::ScholarResult;
use crate::models::Candidate;

/// Dense vector index: cosine top-K with payload/vector hydration.
pub trait VectorSearcher: Send + Sync {
    /// Top-K by cosine descending. Scores are comparable within one call
    /// only. `ef` tunes HNSW recall at search time.
    fn search(&self, vector: &[f32], top_k: usize, ef: usize) -> ScholarResult<Vec<Candidate>>;

    /// Hydrate payload and vector for chunk ids not returned by search.
    /// Keyed by the payload's `chunk_id`, not the point id.
    fn points_by_chunk_ids(
        &self,
        chunk_ids: &[String],
    ) -> ScholarResult<HashMap<String, Candidate>>;
}

/// Inverted-index BM25 search.
pub trait LexicalSearcher: Send + Sync {
    /// BM25-ranked chunk ids. An empty or unopenable index yields an empty
    /// list, never an error.
    fn search(&self, query: &str, top_k: usize) -> ScholarResult<Vec<String>>;
}
