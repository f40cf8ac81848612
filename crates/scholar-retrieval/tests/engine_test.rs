//! End-to-end routing scenarios against mock components.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use scholar_core::config::{PromptConfig, RetrievalConfig};
use scholar_core::constants::{GREETING_ANSWER, LOW_CONFIDENCE_PREFIX};
use scholar_core::errors::ScholarResult;
use scholar_core::intent::Intent;
use scholar_core::models::{
    Candidate, Chunk, ChunkType, CodeTitle, Confidence, DateRange, PointPayload,
};
use scholar_core::traits::{
    ChunkStore, CurriculumStore, Embedder, LexicalSearcher, PairScorer, TextGenerator,
    VectorSearcher, WhitespaceCounter,
};
use scholar_retrieval::engine::{EngineComponents, RetrievalEngine};

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> ScholarResult<Vec<f32>> {
        // Deterministic pseudo-embedding, unit norm.
        let mut v = vec![0.0f32; 8];
        for (i, b) in text.bytes().enumerate() {
            v[i % 8] += (b % 31) as f32;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }

    fn embed_batch(&self, texts: &[String]) -> ScholarResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        8
    }

    fn name(&self) -> &str {
        "hash-embedder"
    }
}

struct StaticDense {
    candidates: Vec<Candidate>,
    search_calls: AtomicUsize,
}

impl StaticDense {
    fn new(candidates: Vec<Candidate>) -> Self {
        StaticDense {
            candidates,
            search_calls: AtomicUsize::new(0),
        }
    }
}

impl VectorSearcher for StaticDense {
    fn search(&self, _: &[f32], top_k: usize, _: usize) -> ScholarResult<Vec<Candidate>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.candidates.iter().take(top_k).cloned().collect())
    }

    fn points_by_chunk_ids(
        &self,
        chunk_ids: &[String],
    ) -> ScholarResult<HashMap<String, Candidate>> {
        Ok(self
            .candidates
            .iter()
            .filter(|c| chunk_ids.iter().any(|id| id == c.chunk_id()))
            .map(|c| (c.chunk_id().to_string(), c.clone()))
            .collect())
    }
}

struct StaticLexical(Vec<String>);

impl LexicalSearcher for StaticLexical {
    fn search(&self, _: &str, top_k: usize) -> ScholarResult<Vec<String>> {
        Ok(self.0.iter().take(top_k).cloned().collect())
    }
}

/// Scores from a fixed map; unknown ids get zero.
struct MapScorer(HashMap<String, f32>);

impl PairScorer for MapScorer {
    fn score(&self, _: &str, docs: &[Chunk]) -> ScholarResult<HashMap<String, f32>> {
        Ok(docs
            .iter()
            .map(|d| (d.chunk_id.clone(), self.0.get(&d.chunk_id).copied().unwrap_or(0.0)))
            .collect())
    }
}

struct MemoryChunks(HashMap<String, Chunk>);

impl ChunkStore for MemoryChunks {
    fn fetch_chunks(&self, chunk_ids: &[String]) -> ScholarResult<HashMap<String, Chunk>> {
        Ok(chunk_ids
            .iter()
            .filter_map(|id| self.0.get(id).map(|c| (id.clone(), c.clone())))
            .collect())
    }
}

#[derive(Default)]
struct StubCurriculum {
    count: Option<u32>,
    range: Option<DateRange>,
    courses: Vec<CodeTitle>,
}

impl CurriculumStore for StubCurriculum {
    fn list_courses(&self) -> ScholarResult<Vec<CodeTitle>> {
        Ok(self.courses.clone())
    }
    fn list_topics(&self) -> ScholarResult<Vec<CodeTitle>> {
        Ok(Vec::new())
    }
    fn learned_at_range(&self, _: &str) -> ScholarResult<Option<DateRange>> {
        Ok(self.range.clone())
    }
    fn count_classes_for_topic(&self, _: &str) -> ScholarResult<Option<u32>> {
        Ok(self.count)
    }
}

struct CannedGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    fn new(reply: &str) -> Self {
        CannedGenerator {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl TextGenerator for CannedGenerator {
    fn generate(&self, prompt: &str, _: u32) -> ScholarResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "canned"
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

fn course_candidate(chunk_id: &str, score: f64, seed: f32) -> Candidate {
    Candidate {
        id: format!("point-{chunk_id}"),
        score,
        vector: Some(vec![seed, 1.0 - seed, 0.2, 0.0, 0.0, 0.0, 0.0, 0.0]),
        payload: Some(PointPayload {
            chunk_id: chunk_id.to_string(),
            title: format!("Title for {chunk_id}"),
            chunk_type: "course".to_string(),
            metadata: serde_json::Value::Null,
        }),
    }
}

fn course_chunk(chunk_id: &str, text: &str) -> Chunk {
    Chunk {
        chunk_id: chunk_id.to_string(),
        chunk_type: ChunkType::Course,
        title: format!("Title for {chunk_id}"),
        text: text.to_string(),
        metadata: serde_json::Value::Null,
    }
}

struct Fixture {
    dense: Arc<StaticDense>,
    generator: Arc<CannedGenerator>,
    engine: RetrievalEngine,
}

fn fixture(top_score: f64, curriculum: StubCurriculum, reply: &str) -> Fixture {
    let dense = Arc::new(StaticDense::new(vec![
        course_candidate("COURSE-1", top_score, 0.9),
        course_candidate("COURSE-2", top_score * 0.8, 0.1),
    ]));
    let chunks: HashMap<String, Chunk> = [
        (
            "COURSE-1".to_string(),
            course_chunk("COURSE-1", "Algorithms course covering 12 topics."),
        ),
        (
            "COURSE-2".to_string(),
            course_chunk("COURSE-2", "Databases course covering SQL joins."),
        ),
    ]
    .into();

    let generator = Arc::new(CannedGenerator::new(reply));
    let scores: HashMap<String, f32> = [
        ("COURSE-1".to_string(), 0.9f32),
        ("COURSE-2".to_string(), 0.5f32),
    ]
    .into();

    let mut config = RetrievalConfig::default();
    config.retry_base_ms = 0;

    let engine = RetrievalEngine::new(
        EngineComponents {
            embedder: Arc::new(HashEmbedder),
            dense: dense.clone(),
            lexical: Arc::new(StaticLexical(vec!["COURSE-2".to_string()])),
            scorer: Arc::new(MapScorer(scores)),
            chunks: Arc::new(MemoryChunks(chunks)),
            curriculum: Arc::new(curriculum),
            generator: generator.clone(),
            token_counter: Arc::new(WhitespaceCounter),
        },
        config,
        PromptConfig::default(),
        300,
    );

    Fixture {
        dense,
        generator,
        engine,
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn greeting_skips_retrieval() {
    let f = fixture(0.8, StubCurriculum::default(), "unused");
    let result = f.engine.ask("hello", None).unwrap();
    assert_eq!(result.answer, GREETING_ANSWER);
    assert_eq!(result.confidence, Confidence::High);
    assert_eq!(
        serde_json::to_value(result.intent).unwrap(),
        serde_json::json!("GREETING")
    );
    assert_eq!(f.dense.search_calls.load(Ordering::SeqCst), 0);
    assert!(f.generator.prompts.lock().unwrap().is_empty());
}

#[test]
fn factual_count_answers_deterministically() {
    let curriculum = StubCurriculum {
        count: Some(5),
        ..Default::default()
    };
    let f = fixture(0.8, curriculum, "unused");
    let result = f.engine.ask("How many classes for C1-T1?", None).unwrap();
    assert!(result.answer.contains("You have 5 classes for C1-T1."));
    assert!(result.sources.contains(&"SQL-count_classes_C1-T1".to_string()));
    assert_eq!(result.intent, Intent::Factual);
    assert_eq!(result.confidence, Confidence::High);
    assert!(result.sql.as_deref().unwrap().contains("COUNT(*)"));
    // The deterministic path never calls the generator.
    assert!(f.generator.prompts.lock().unwrap().is_empty());
}

#[test]
fn factual_date_range_collapses_to_long_date() {
    let day = chrono::NaiveDate::from_ymd_opt(2025, 6, 21)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let curriculum = StubCurriculum {
        range: Some(DateRange {
            earliest: Some(day),
            latest: Some(day),
        }),
        ..Default::default()
    };
    let f = fixture(0.8, curriculum, "unused");
    let result = f.engine.ask("When did I learn C2-T3?", None).unwrap();
    assert_eq!(result.answer, "You learned C2-T3 on June 21, 2025.");
    assert_eq!(result.intent, Intent::Factual);
}

#[test]
fn pure_semantic_cites_and_is_high_confidence() {
    let f = fixture(
        0.82,
        StubCurriculum::default(),
        "Each course builds on the last. [source: COURSE-1]",
    );
    let result = f.engine.ask("Describe each course", None).unwrap();
    assert_eq!(result.intent, Intent::Semantic);
    assert_eq!(result.confidence, Confidence::High);
    assert!(result.answer.contains("[source:"));
    assert!(result.sources.iter().any(|s| s.starts_with("COURSE-")));
    let chain = result.retrieval_chain.expect("chain");
    assert_eq!(chain[0].id, "COURSE-1");
    // The strict prompt carried the evidence.
    let prompts = f.generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("[CHUNK id=COURSE-1 type=course]"));
    assert!(prompts[0].contains("factual assistant"));
}

#[test]
fn weak_dense_score_triggers_lenient_fallback() {
    let f = fixture(
        0.12,
        StubCurriculum::default(),
        "there might be six of them",
    );
    let result = f.engine.ask("How many moons in our syllabus?", None).unwrap();
    assert_eq!(result.intent, Intent::Factual);
    assert_eq!(result.confidence, Confidence::Low);
    assert!(result.answer.starts_with(LOW_CONFIDENCE_PREFIX));
    assert!(result.answer.contains("there might be six of them"));
    // The lenient template, not the strict one.
    let prompts = f.generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("general knowledge"));
}

#[test]
fn mixed_injects_sql_chunk_and_reranks() {
    let curriculum = StubCurriculum {
        count: Some(5),
        ..Default::default()
    };
    let f = fixture(
        0.8,
        curriculum,
        "You have 5 classes. [source: SQL-count_classes_C1-T1]",
    );
    let result = f
        .engine
        .ask("How many classes for C1-T1, and explain the topic?", None)
        .unwrap();
    assert_eq!(result.intent, Intent::Mixed);
    assert_eq!(result.sources, vec!["SQL-count_classes_C1-T1".to_string()]);
    assert!(result.sql.is_some());
    // The injected chunk made it into the prompt evidence.
    let prompts = f.generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("[CHUNK id=SQL-count_classes_C1-T1 type=sql-result]"));
    // Chain includes both the SQL chunk and dense context.
    let chain = result.retrieval_chain.expect("chain");
    assert!(chain.iter().any(|r| r.id == "SQL-count_classes_C1-T1"));
    assert!(chain.iter().any(|r| r.id == "COURSE-1"));
}

#[test]
fn failed_verification_downgrades_confidence() {
    // 99 appears nowhere in the evidence.
    let f = fixture(
        0.82,
        StubCurriculum::default(),
        "There are 99 topics. [source: COURSE-1]",
    );
    let result = f.engine.ask("Describe each course", None).unwrap();
    assert_eq!(result.confidence, Confidence::Medium);
}

#[test]
fn retrieval_outcome_is_cached_per_normalized_query() {
    let f = fixture(0.82, StubCurriculum::default(), "fine. [source: COURSE-1]");
    f.engine.retrieve("Describe each course").unwrap();
    f.engine.retrieve("  describe each COURSE  ").unwrap();
    assert_eq!(f.dense.search_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn empty_query_is_rejected() {
    let f = fixture(0.8, StubCurriculum::default(), "unused");
    assert!(f.engine.ask("   ", None).is_err());
}

#[test]
fn empty_retrieval_still_generates_with_lenient_prompt() {
    let generator = Arc::new(CannedGenerator::new("best effort"));
    let mut config = RetrievalConfig::default();
    config.retry_base_ms = 0;
    let engine = RetrievalEngine::new(
        EngineComponents {
            embedder: Arc::new(HashEmbedder),
            dense: Arc::new(StaticDense::new(Vec::new())),
            lexical: Arc::new(StaticLexical(Vec::new())),
            scorer: Arc::new(MapScorer(HashMap::new())),
            chunks: Arc::new(MemoryChunks(HashMap::new())),
            curriculum: Arc::new(StubCurriculum::default()),
            generator: generator.clone(),
            token_counter: Arc::new(WhitespaceCounter),
        },
        config,
        PromptConfig::default(),
        300,
    );
    let result = engine.ask("Describe each course", None).unwrap();
    assert_eq!(result.confidence, Confidence::Low);
    assert!(result.answer.starts_with(LOW_CONFIDENCE_PREFIX));
    assert!(result.sources.is_empty());
}
