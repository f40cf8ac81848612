//! Configuration defaults and env overrides.

use scholar_core::config::{
    DenseIndexConfig, GatewayConfig, LlmConfig, PromptConfig, RetrievalConfig, ScholarConfig,
};

#[test]
fn retrieval_defaults_match_the_deployment_docs() {
    let c = RetrievalConfig::default();
    assert_eq!(c.topk_dense, 100);
    assert_eq!(c.topk_lex, 50);
    assert_eq!(c.mmr_final_size, 20);
    assert!((c.mmr_lambda - 0.7).abs() < 1e-9);
    assert_eq!(c.rerank_top_n, 20);
    assert_eq!(c.rerank_final_n, 6);
    assert_eq!(c.context_k, 4);
    assert_eq!(c.ef, 200);
    assert!((c.score_fallback_threshold - 0.3).abs() < 1e-9);
    assert_eq!(c.embed_cache_size, 1000);
    assert_eq!(c.retrieval_cache_size, 500);
    assert_eq!(c.retry_attempts, 3);
    assert_eq!(c.retry_base_ms, 200);
}

#[test]
fn prompt_budget_arithmetic() {
    let c = PromptConfig::default();
    assert_eq!(c.max_tokens, 4096);
    assert_eq!(c.reserved_answer, 400);
    assert_eq!(c.overhead, 200);
    assert_eq!(c.evidence_budget(), 3496);
    assert_eq!(c.history_max_turns, 6);
    assert_eq!(c.history_turn_char_cap, 800);

    let degenerate = PromptConfig {
        max_tokens: 100,
        reserved_answer: 400,
        overhead: 200,
        ..PromptConfig::default()
    };
    assert_eq!(degenerate.evidence_budget(), 0);
}

#[test]
fn llm_and_index_defaults() {
    let llm = LlmConfig::default();
    assert_eq!(llm.provider, "llama");
    assert_eq!(llm.max_tokens, 300);
    assert!((llm.temperature - 0.2).abs() < 1e-9);
    assert_eq!(llm.read_timeout_secs, 180);

    let dense = DenseIndexConfig::default();
    assert_eq!(dense.collection, "learning_chunks");
    assert_eq!(dense.dimensions, 768);
}

#[test]
fn gateway_defaults() {
    let g = GatewayConfig::default();
    assert_eq!(g.session_ttl_secs, 900);
    assert_eq!(g.payload_cache_max, 1000);
    assert_eq!(g.payload_cache_ttl_secs, 300);
    assert_eq!(g.forward_timeout_secs, 120);
    assert!(g.session_store_path.is_none());
}

#[test]
fn full_config_serializes_round_trip() {
    let config = ScholarConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    let back: ScholarConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.retrieval.topk_dense, config.retrieval.topk_dense);
    assert_eq!(back.llm.provider, config.llm.provider);
}

#[test]
fn partial_json_fills_defaults() {
    let config: ScholarConfig =
        serde_json::from_str(r#"{ "retrieval": { "context_k": 8 } }"#).unwrap();
    assert_eq!(config.retrieval.context_k, 8);
    assert_eq!(config.retrieval.topk_dense, 100);
    assert_eq!(config.prompt.max_tokens, 4096);
}
