use serde::{Deserialize, Serialize};

use super::env_or;

/// Retrieval pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Dense top-K fetched from the vector store.
    pub topk_dense: usize,
    /// Lexical (BM25) top-K.
    pub topk_lex: usize,
    /// Candidates surviving MMR diversification.
    pub mmr_final_size: usize,
    /// MMR relevance/diversity trade-off, 0 ≤ λ ≤ 1.
    pub mmr_lambda: f64,
    /// How many MMR survivors the cross-encoder rescores.
    pub rerank_top_n: usize,
    /// Final reranked list length.
    pub rerank_final_n: usize,
    /// Chunks handed to prompt assembly.
    pub context_k: usize,
    /// HNSW `ef` search parameter.
    pub ef: usize,
    /// Below this dense top-1 score the router switches to the lenient
    /// prompt and flags low confidence.
    pub score_fallback_threshold: f64,
    /// Bounded LRU size of the query→vector cache.
    pub embed_cache_size: u64,
    /// Bounded LRU size of the query→context cache.
    pub retrieval_cache_size: u64,
    /// Attempts for retryable pipeline stages.
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds (doubles per attempt).
    pub retry_base_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        RetrievalConfig {
            topk_dense: 100,
            topk_lex: 50,
            mmr_final_size: 20,
            mmr_lambda: 0.7,
            rerank_top_n: 20,
            rerank_final_n: 6,
            context_k: 4,
            ef: 200,
            score_fallback_threshold: 0.3,
            embed_cache_size: 1000,
            retrieval_cache_size: 500,
            retry_attempts: 3,
            retry_base_ms: 200,
        }
    }
}

impl RetrievalConfig {
    pub fn from_env() -> Self {
        let d = RetrievalConfig::default();
        RetrievalConfig {
            topk_dense: env_or("TOPK_DENSE", d.topk_dense),
            topk_lex: env_or("TOPK_LEX", d.topk_lex),
            mmr_final_size: env_or("MMR_FINAL_SIZE", d.mmr_final_size),
            mmr_lambda: env_or("MMR_LAMBDA", d.mmr_lambda),
            rerank_top_n: env_or("RERANK_TOP_N", d.rerank_top_n),
            rerank_final_n: env_or("RERANK_FINAL_N", d.rerank_final_n),
            context_k: env_or("CONTEXT_K", d.context_k),
            ef: env_or("QDRANT_EF", d.ef),
            score_fallback_threshold: env_or(
                "RAG_SCORE_FALLBACK_THRESHOLD",
                d.score_fallback_threshold,
            ),
            ..d
        }
    }
}
