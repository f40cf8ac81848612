//! Vector store REST client.
//!
//! Talks JSON to a Qdrant-compatible server: top-K cosine search with an
//! HNSW `ef` override, point fetch, scroll with a payload filter on
//! `chunk_id`, collection bootstrap, and idempotent upsert keyed by the
//! deterministic point id.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use scholar_core::config::DenseIndexConfig;
use scholar_core::errors::{IndexError, ScholarResult};
use scholar_core::ids::point_id;
use scholar_core::models::{Candidate, PointPayload};
use scholar_core::traits::VectorSearcher;

/// One point to upsert: deterministic id, unit-norm vector, payload mirror.
#[derive(Debug, Clone, Serialize)]
pub struct PointRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

impl PointRecord {
    /// Build a record for a chunk, deriving the point id from `chunk_id`.
    pub fn new(payload: PointPayload, vector: Vec<f32>) -> Self {
        PointRecord {
            id: point_id(&payload.chunk_id).to_string(),
            vector,
            payload,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: serde_json::Value,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    payload: Option<PointPayload>,
    #[serde(default)]
    vector: Option<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScrollResponse {
    result: Option<ScrollResult>,
}

/// Point listings come back either nested under `points` (scroll) or as a
/// bare array (retrieve-by-ids on some server versions).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScrollResult {
    Nested {
        #[serde(default)]
        points: Vec<ScoredPoint>,
    },
    List(Vec<ScoredPoint>),
}

fn point_to_candidate(p: ScoredPoint) -> Candidate {
    // Point ids may arrive as JSON strings or integers.
    let id = match &p.id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Candidate {
        id,
        score: p.score.unwrap_or(0.0),
        vector: p.vector,
        payload: p.payload,
    }
}

/// Decode a search response body into candidates, cosine descending.
pub(crate) fn parse_search_body(body: &str) -> ScholarResult<Vec<Candidate>> {
    let resp: SearchResponse = serde_json::from_str(body).map_err(|e| IndexError::Decode {
        reason: format!("search response: {e}"),
    })?;
    Ok(resp.result.into_iter().map(point_to_candidate).collect())
}

/// Decode a scroll/points response body into a map keyed by `chunk_id`
/// (falling back to the point id when no payload came back).
pub(crate) fn parse_points_body(body: &str) -> ScholarResult<HashMap<String, Candidate>> {
    let resp: ScrollResponse = serde_json::from_str(body).map_err(|e| IndexError::Decode {
        reason: format!("points response: {e}"),
    })?;
    let points = match resp.result {
        Some(ScrollResult::Nested { points }) => points,
        Some(ScrollResult::List(points)) => points,
        None => Vec::new(),
    };
    let mut map = HashMap::new();
    for p in points {
        let c = point_to_candidate(p);
        map.insert(c.chunk_id().to_string(), c);
    }
    Ok(map)
}

/// Blocking REST client for the vector store.
pub struct QdrantIndex {
    http: reqwest::blocking::Client,
    base_url: String,
    collection: String,
}

impl QdrantIndex {
    pub fn new(config: &DenseIndexConfig) -> ScholarResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .build()
            .map_err(|e| IndexError::Transport {
                reason: e.to_string(),
            })?;
        Ok(QdrantIndex {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
        })
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, self.collection, suffix)
    }

    fn post(&self, url: &str, body: serde_json::Value) -> ScholarResult<String> {
        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .map_err(|e| IndexError::Transport {
                reason: e.to_string(),
            })?;
        let status = resp.status();
        let text = resp.text().map_err(|e| IndexError::Transport {
            reason: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(IndexError::BadResponse {
                status: status.as_u16(),
                body: text,
            }
            .into());
        }
        Ok(text)
    }

    /// Create the collection (cosine distance, `dim` components) when it
    /// does not exist yet.
    pub fn ensure_collection(&self, dim: usize) -> ScholarResult<()> {
        let url = self.collection_url("");
        let exists = self
            .http
            .get(&url)
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false);
        if exists {
            debug!(collection = %self.collection, "collection exists");
            return Ok(());
        }
        let body = json!({ "vectors": { "size": dim, "distance": "Cosine" } });
        let resp = self
            .http
            .put(&url)
            .json(&body)
            .send()
            .map_err(|e| IndexError::Transport {
                reason: e.to_string(),
            })?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().unwrap_or_default();
            return Err(IndexError::BadResponse { status, body: text }.into());
        }
        debug!(collection = %self.collection, dim, "collection created");
        Ok(())
    }

    /// Upsert points. Deterministic ids make repeat runs idempotent.
    pub fn upsert_points(&self, points: &[PointRecord]) -> ScholarResult<()> {
        if points.is_empty() {
            return Ok(());
        }
        let url = format!("{}?wait=true", self.collection_url("/points"));
        let body = json!({ "points": points });
        let resp = self
            .http
            .put(&url)
            .json(&body)
            .send()
            .map_err(|e| IndexError::Transport {
                reason: e.to_string(),
            })?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().unwrap_or_default();
            return Err(IndexError::BadResponse { status, body: text }.into());
        }
        debug!(count = points.len(), "points upserted");
        Ok(())
    }

    /// Fetch points by their point ids (deterministic UUIDs).
    pub fn points_by_ids(&self, ids: &[String]) -> ScholarResult<HashMap<String, Candidate>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let body = json!({ "ids": ids, "with_payload": true, "with_vector": true });
        let text = self.post(&self.collection_url("/points"), body)?;
        parse_points_body(&text)
    }
}

impl VectorSearcher for QdrantIndex {
    fn search(&self, vector: &[f32], top_k: usize, ef: usize) -> ScholarResult<Vec<Candidate>> {
        let body = json!({
            "vector": vector,
            "limit": top_k,
            "with_payload": true,
            "with_vector": true,
            "params": { "ef": ef },
        });
        let text = self.post(&self.collection_url("/points/search"), body)?;
        let candidates = parse_search_body(&text)?;
        debug!(hits = candidates.len(), top_k, ef, "dense search");
        Ok(candidates)
    }

    fn points_by_chunk_ids(
        &self,
        chunk_ids: &[String],
    ) -> ScholarResult<HashMap<String, Candidate>> {
        if chunk_ids.is_empty() {
            return Ok(HashMap::new());
        }
        // Scroll with a should-match filter on the payload's chunk_id.
        let conditions: Vec<serde_json::Value> = chunk_ids
            .iter()
            .map(|cid| json!({ "key": "chunk_id", "match": { "value": cid } }))
            .collect();
        let body = json!({
            "limit": chunk_ids.len(),
            "with_payload": true,
            "with_vector": true,
            "filter": { "should": conditions },
        });
        let text = self.post(&self.collection_url("/points/scroll"), body)?;
        parse_points_body(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_body_parses_scores_payloads_and_vectors() {
        let body = r#"{"result":[
            {"id":"4fb7254c-aeba-3e25-9d34-c904efb9f595","score":0.82,
             "payload":{"chunk_id":"TOPIC-11","title":"Databases and SQL","chunk_type":"course","metadata":{}},
             "vector":[0.1,0.2]},
            {"id":"abc","score":0.5}
        ]}"#;
        let candidates = parse_search_body(body).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].chunk_id(), "TOPIC-11");
        assert_eq!(candidates[0].vector.as_deref(), Some(&[0.1, 0.2][..]));
        assert!((candidates[0].score - 0.82).abs() < 1e-9);
        assert_eq!(candidates[1].chunk_id(), "abc");
        assert!(candidates[1].vector.is_none());
    }

    #[test]
    fn points_body_keys_by_chunk_id() {
        let body = r#"{"result":{"points":[
            {"id":"u1","payload":{"chunk_id":"CLASS-7","title":"t","chunk_type":"class","metadata":{}},
             "vector":[1.0]},
            {"id":"u2"}
        ]}}"#;
        let map = parse_points_body(body).unwrap();
        assert!(map.contains_key("CLASS-7"));
        assert!(map.contains_key("u2"));
    }

    #[test]
    fn flat_points_body_also_parses() {
        let body = r#"{"result":[
            {"id":"u1","payload":{"chunk_id":"TOPIC-3","title":"t","chunk_type":"topic","metadata":{}}}
        ]}"#;
        let map = parse_points_body(body).unwrap();
        assert!(map.contains_key("TOPIC-3"));
    }

    #[test]
    fn integer_point_ids_are_tolerated() {
        let body = r#"{"result":[{"id":42,"score":0.1}]}"#;
        let candidates = parse_search_body(body).unwrap();
        assert_eq!(candidates[0].id, "42");
    }

    #[test]
    fn point_record_derives_deterministic_id() {
        let payload = PointPayload {
            chunk_id: "TOPIC-11".into(),
            title: String::new(),
            chunk_type: "topic".into(),
            metadata: serde_json::Value::Null,
        };
        let record = PointRecord::new(payload, vec![0.0; 4]);
        assert_eq!(record.id, "4fb7254c-aeba-3e25-9d34-c904efb9f595");
    }
}
