//! Query API request and response DTOs.

use serde::{Deserialize, Serialize};

use crate::intent::Intent;

/// One prior conversation turn, shared by the gateway with the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    pub content: String,
}

/// Request body for the query endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<ConversationTurn>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Answer confidence. Lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One ranked candidate summary for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSource {
    pub id: String,
    pub score: f64,
}

/// The engine's answer to one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<String>,
    pub intent: Intent,
    pub confidence: Confidence,
    /// The deterministic query that produced an authoritative chunk, for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    /// Ranked candidate summaries for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_chain: Option<Vec<RankedSource>>,
}

impl QueryResult {
    /// A retrieval-free answer (greetings, deterministic sentences).
    pub fn direct(answer: impl Into<String>, intent: Intent, confidence: Confidence) -> Self {
        QueryResult {
            answer: answer.into(),
            sources: Vec::new(),
            intent,
            confidence,
            sql: None,
            retrieval_chain: None,
        }
    }
}
