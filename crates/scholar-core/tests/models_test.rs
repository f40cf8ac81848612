//! Wire-shape tests for the shared models.

use scholar_core::intent::Intent;
use scholar_core::models::{Confidence, QueryRequest, QueryResult, RankedSource};

#[test]
fn intent_serializes_uppercase() {
    assert_eq!(serde_json::to_value(Intent::Greeting).unwrap(), "GREETING");
    assert_eq!(serde_json::to_value(Intent::Factual).unwrap(), "FACTUAL");
    assert_eq!(serde_json::to_value(Intent::Semantic).unwrap(), "SEMANTIC");
    assert_eq!(serde_json::to_value(Intent::Mixed).unwrap(), "MIXED");
    let back: Intent = serde_json::from_str("\"MIXED\"").unwrap();
    assert_eq!(back, Intent::Mixed);
}

#[test]
fn confidence_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Confidence::High).unwrap(), "high");
    assert_eq!(serde_json::to_value(Confidence::Low).unwrap(), "low");
}

#[test]
fn query_request_tolerates_missing_optionals() {
    let req: QueryRequest = serde_json::from_str(r#"{ "query": "hello" }"#).unwrap();
    assert_eq!(req.query, "hello");
    assert!(req.history.is_none());
    assert!(req.session_id.is_none());

    let full: QueryRequest = serde_json::from_str(
        r#"{
            "query": "When is it offered?",
            "history": [ { "role": "user", "content": "Tell me about Databases and SQL" } ],
            "session_id": "abc"
        }"#,
    )
    .unwrap();
    assert_eq!(full.history.unwrap().len(), 1);
    assert_eq!(full.session_id.as_deref(), Some("abc"));
}

#[test]
fn query_result_omits_empty_optionals() {
    let result = QueryResult {
        answer: "Hello!".into(),
        sources: vec![],
        intent: Intent::Greeting,
        confidence: Confidence::High,
        sql: None,
        retrieval_chain: None,
    };
    let value = serde_json::to_value(&result).unwrap();
    assert!(value.get("sql").is_none());
    assert!(value.get("retrieval_chain").is_none());

    let with_chain = QueryResult {
        sql: Some("SELECT 1".into()),
        retrieval_chain: Some(vec![RankedSource {
            id: "TOPIC-11".into(),
            score: 0.9,
        }]),
        ..result
    };
    let value = serde_json::to_value(&with_chain).unwrap();
    assert_eq!(value["sql"], "SELECT 1");
    assert_eq!(value["retrieval_chain"][0]["id"], "TOPIC-11");
}
