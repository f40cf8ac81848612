//! The retrieval orchestrator.
//!
//! `retrieve` runs the semantic pipeline; `ask` routes a query by intent
//! between the relational path, the semantic path, or the fused hybrid,
//! then generates and verifies an answer.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use scholar_core::config::{PromptConfig, RetrievalConfig};
use scholar_core::constants::{GREETING_ANSWER, LOW_CONFIDENCE_PREFIX};
use scholar_core::errors::{RetrievalError, ScholarResult};
use scholar_core::intent::Intent;
use scholar_core::models::{Chunk, Confidence, ConversationTurn, QueryResult, RankedSource};
use scholar_core::traits::{
    ChunkStore, CurriculumStore, Embedder, LexicalSearcher, PairScorer, TextGenerator,
    TokenCounter, VectorSearcher,
};

use crate::cache::QueryCache;
use crate::intent::classify;
use crate::merge::merge_and_dedupe;
use crate::mmr;
use crate::prompt::PromptAssembler;
use crate::retry::with_retry;
use crate::router::{self, FactualHit};
use crate::verify::Verifier;

/// Everything the engine composes. All seams are trait objects so tests
/// can swap any of them.
pub struct EngineComponents {
    pub embedder: Arc<dyn Embedder>,
    pub dense: Arc<dyn VectorSearcher>,
    pub lexical: Arc<dyn LexicalSearcher>,
    pub scorer: Arc<dyn PairScorer>,
    pub chunks: Arc<dyn ChunkStore>,
    pub curriculum: Arc<dyn CurriculumStore>,
    pub generator: Arc<dyn TextGenerator>,
    pub token_counter: Arc<dyn TokenCounter>,
}

/// Result of the semantic pipeline for one query.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    /// Reranked context chunks, most relevant first.
    pub context: Vec<Chunk>,
    /// Dense top-1 cosine, the confidence signal.
    pub top_dense_score: f64,
    /// Ranked candidate summaries for diagnostics.
    pub chain: Vec<RankedSource>,
}

pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    dense: Arc<dyn VectorSearcher>,
    lexical: Arc<dyn LexicalSearcher>,
    scorer: Arc<dyn PairScorer>,
    chunks: Arc<dyn ChunkStore>,
    curriculum: Arc<dyn CurriculumStore>,
    generator: Arc<dyn TextGenerator>,
    prompt: PromptAssembler,
    config: RetrievalConfig,
    llm_max_tokens: u32,
    embed_cache: QueryCache<Vec<f32>>,
    context_cache: QueryCache<RetrievalOutcome>,
}

impl RetrievalEngine {
    pub fn new(
        components: EngineComponents,
        config: RetrievalConfig,
        prompt_config: PromptConfig,
        llm_max_tokens: u32,
    ) -> Self {
        let prompt = PromptAssembler::new(prompt_config, components.token_counter.clone());
        RetrievalEngine {
            embed_cache: QueryCache::new(config.embed_cache_size),
            context_cache: QueryCache::new(config.retrieval_cache_size),
            embedder: components.embedder,
            dense: components.dense,
            lexical: components.lexical,
            scorer: components.scorer,
            chunks: components.chunks,
            curriculum: components.curriculum,
            generator: components.generator,
            prompt,
            config,
            llm_max_tokens,
        }
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.config.retry_base_ms)
    }

    /// The semantic pipeline: embed → dense → lexical → merge → MMR →
    /// row fetch → cross-encoder rerank → context cut. Cached per
    /// normalized query.
    pub fn retrieve_outcome(&self, query: &str) -> ScholarResult<RetrievalOutcome> {
        if let Some(cached) = self.context_cache.get(query) {
            debug!("retrieval cache hit");
            return Ok(cached);
        }

        let qvec = match self.embed_cache.get(query) {
            Some(vec) => vec,
            None => {
                let vec = self.embedder.embed(query)?;
                self.embed_cache.put(query, vec.clone());
                vec
            }
        };

        let dense = with_retry(self.config.retry_attempts, self.retry_delay(), || {
            self.dense.search(&qvec, self.config.topk_dense, self.config.ef)
        })?;
        let top_dense_score = dense.first().map(|c| c.score).unwrap_or(0.0);
        debug!(hits = dense.len(), top_dense_score, "dense search done");

        // A missing or broken lexical index degrades to dense-only.
        let lex_ids = match self.lexical.search(query, self.config.topk_lex) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "lexical search failed, continuing dense-only");
                Vec::new()
            }
        };

        let merged = merge_and_dedupe(dense, &lex_ids, &*self.dense)?;
        let selected = mmr::rerank(
            &merged,
            &qvec,
            self.config.mmr_final_size,
            self.config.mmr_lambda,
        );

        let ids: Vec<String> = selected.iter().map(|c| c.chunk_id().to_string()).collect();
        let rows = with_retry(self.config.retry_attempts, self.retry_delay(), || {
            self.chunks.fetch_chunks(&ids)
        })?;
        let ordered: Vec<Chunk> = ids.iter().filter_map(|id| rows.get(id).cloned()).collect();

        let mut to_rerank: Vec<Chunk> = ordered
            .into_iter()
            .take(self.config.rerank_top_n)
            .collect();
        let scores = self.scorer.score(query, &to_rerank)?;
        to_rerank.sort_by(|a, b| {
            let sa = scores.get(&a.chunk_id).copied().unwrap_or(0.0);
            let sb = scores.get(&b.chunk_id).copied().unwrap_or(0.0);
            sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
        });

        let chain: Vec<RankedSource> = to_rerank
            .iter()
            .map(|c| RankedSource {
                id: c.chunk_id.clone(),
                score: scores.get(&c.chunk_id).copied().unwrap_or(0.0) as f64,
            })
            .collect();

        let context: Vec<Chunk> = to_rerank
            .into_iter()
            .take(self.config.rerank_final_n)
            .take(self.config.context_k)
            .collect();

        info!(
            context = context.len(),
            top_dense_score, "retrieval pipeline complete"
        );

        let outcome = RetrievalOutcome {
            context,
            top_dense_score,
            chain,
        };
        self.context_cache.put(query, outcome.clone());
        Ok(outcome)
    }

    /// Reranked context chunks for a query.
    pub fn retrieve(&self, query: &str) -> ScholarResult<Vec<Chunk>> {
        Ok(self.retrieve_outcome(query)?.context)
    }

    /// Answer one query with optional conversation history.
    pub fn ask(
        &self,
        query: &str,
        history: Option<&[ConversationTurn]>,
    ) -> ScholarResult<QueryResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RetrievalError::EmptyQuery.into());
        }

        let intent = classify(query);
        debug!(%intent, "classified query");

        match intent {
            Intent::Greeting => Ok(QueryResult::direct(
                GREETING_ANSWER,
                Intent::Greeting,
                Confidence::High,
            )),
            Intent::Factual => match router::try_deterministic(&*self.curriculum, query)? {
                Some(hit) => Ok(QueryResult {
                    answer: hit.answer,
                    sources: vec![hit.chunk.chunk_id],
                    intent: Intent::Factual,
                    confidence: Confidence::High,
                    sql: Some(hit.sql),
                    retrieval_chain: None,
                }),
                None => self.answer_semantic(query, history, Intent::Factual),
            },
            Intent::Semantic => self.answer_semantic(query, history, Intent::Semantic),
            Intent::Mixed => match router::try_deterministic(&*self.curriculum, query)? {
                Some(hit) => self.answer_mixed(hit, query, history),
                None => self.answer_semantic(query, history, Intent::Mixed),
            },
        }
    }

    fn generate(&self, prompt: &str) -> ScholarResult<String> {
        with_retry(self.config.retry_attempts, self.retry_delay(), || {
            self.generator.generate(prompt, self.llm_max_tokens)
        })
    }

    /// Pure RAG. Low dense confidence switches to the lenient prompt and
    /// prepends the disclaimer outside the prompt.
    fn answer_semantic(
        &self,
        query: &str,
        history: Option<&[ConversationTurn]>,
        intent: Intent,
    ) -> ScholarResult<QueryResult> {
        let outcome = self.retrieve_outcome(query)?;
        let low = outcome.context.is_empty()
            || outcome.top_dense_score < self.config.score_fallback_threshold;

        if low {
            info!(
                top_dense_score = outcome.top_dense_score,
                "low-confidence fallback, using lenient prompt"
            );
            let prompt =
                self.prompt
                    .build_lenient(&outcome.context, query, self.config.context_k, history);
            let raw = self.generate(&prompt)?;
            return Ok(QueryResult {
                answer: format!("{LOW_CONFIDENCE_PREFIX}{}", raw.trim()),
                sources: outcome.context.iter().map(|c| c.chunk_id.clone()).collect(),
                intent,
                confidence: Confidence::Low,
                sql: None,
                retrieval_chain: Some(outcome.chain),
            });
        }

        let prompt =
            self.prompt
                .build_strict(&outcome.context, query, self.config.context_k, history);
        let raw = self.generate(&prompt)?;
        let answer = raw.trim().to_string();
        let report = Verifier::new(&outcome.context).verify(&answer);
        let confidence = if report.ok {
            Confidence::High
        } else {
            warn!(errors = ?report.errors, "verification failed, downgrading confidence");
            Confidence::Medium
        };
        let sources = if report.cited_chunk_ids.is_empty() {
            outcome.context.iter().map(|c| c.chunk_id.clone()).collect()
        } else {
            report.cited_chunk_ids.clone()
        };

        Ok(QueryResult {
            answer,
            sources,
            intent,
            confidence,
            sql: None,
            retrieval_chain: Some(outcome.chain),
        })
    }

    /// Mixed routing: the relational hit is injected at the top of the
    /// RAG context, the merged set is cross-encoder reranked, and the
    /// generator produces the final answer.
    fn answer_mixed(
        &self,
        hit: FactualHit,
        query: &str,
        history: Option<&[ConversationTurn]>,
    ) -> ScholarResult<QueryResult> {
        let outcome = self.retrieve_outcome(query)?;

        let mut merged: Vec<Chunk> = Vec::with_capacity(outcome.context.len() + 1);
        merged.push(hit.chunk.clone());
        for chunk in &outcome.context {
            if chunk.chunk_id != hit.chunk.chunk_id {
                merged.push(chunk.clone());
            }
        }

        let scores = self.scorer.score(query, &merged)?;
        merged.sort_by(|a, b| {
            let sa = scores.get(&a.chunk_id).copied().unwrap_or(0.0);
            let sb = scores.get(&b.chunk_id).copied().unwrap_or(0.0);
            sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
        });

        let chain: Vec<RankedSource> = merged
            .iter()
            .map(|c| RankedSource {
                id: c.chunk_id.clone(),
                score: scores.get(&c.chunk_id).copied().unwrap_or(0.0) as f64,
            })
            .collect();

        let context: Vec<Chunk> = merged
            .into_iter()
            .take(self.config.rerank_final_n)
            .take(self.config.context_k)
            .collect();

        let prompt = self
            .prompt
            .build_strict(&context, query, self.config.context_k, history);
        let raw = self.generate(&prompt)?;
        let answer = raw.trim().to_string();
        let report = Verifier::new(&context).verify(&answer);
        let confidence = if report.ok {
            Confidence::High
        } else {
            warn!(errors = ?report.errors, "verification failed, downgrading confidence");
            Confidence::Medium
        };
        let sources = if report.cited_chunk_ids.is_empty() {
            context.iter().map(|c| c.chunk_id.clone()).collect()
        } else {
            report.cited_chunk_ids.clone()
        };

        Ok(QueryResult {
            answer,
            sources,
            intent: Intent::Mixed,
            confidence,
            sql: Some(hit.sql),
            retrieval_chain: Some(chain),
        })
    }
}
