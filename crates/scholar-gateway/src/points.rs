//! Payload resolution against the vector store.
//!
//! Fast path: fetch by the deterministic point id derived from the chunk
//! id. Slow path: scroll with a payload filter. Results go through a
//! bounded TTL cache so repeated follow-ups in a session stay O(1).

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use scholar_core::config::GatewayConfig;
use scholar_core::ids::point_id;
use scholar_core::models::PointPayload;

use crate::metrics::GatewayMetrics;

#[derive(Debug, Deserialize)]
struct PointEntry {
    #[serde(default)]
    payload: Option<PointPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PointsResult {
    // Some server versions return the list directly, others nest it.
    List(Vec<PointEntry>),
    Nested { points: Vec<PointEntry> },
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    result: Option<PointsResult>,
}

/// Pull payloads out of a points/scroll response body, tolerating both
/// result shapes.
fn parse_payloads(body: &str) -> Vec<PointPayload> {
    let Ok(resp) = serde_json::from_str::<PointsResponse>(body) else {
        return Vec::new();
    };
    let entries = match resp.result {
        Some(PointsResult::List(entries)) => entries,
        Some(PointsResult::Nested { points }) => points,
        None => Vec::new(),
    };
    entries.into_iter().filter_map(|e| e.payload).collect()
}

/// Async point-payload client with LRU+TTL cache.
pub struct PayloadResolver {
    http: reqwest::Client,
    base_url: String,
    collection: String,
    cache: Cache<String, PointPayload>,
    metrics: Arc<GatewayMetrics>,
}

impl PayloadResolver {
    pub fn new(config: &GatewayConfig, metrics: Arc<GatewayMetrics>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        let cache = Cache::builder()
            .max_capacity(config.payload_cache_max)
            .time_to_live(Duration::from_secs(config.payload_cache_ttl_secs))
            .build();
        PayloadResolver {
            http,
            base_url: config.qdrant_url.trim_end_matches('/').to_string(),
            collection: config.qdrant_collection.clone(),
            cache,
            metrics,
        }
    }

    fn points_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, self.collection, suffix)
    }

    /// Resolve the payload for a chunk id, cache first.
    pub async fn resolve(&self, chunk_id: &str) -> Option<PointPayload> {
        if let Some(payload) = self.cache.get(chunk_id) {
            GatewayMetrics::incr(&self.metrics.payload_cache_hits);
            return Some(payload);
        }
        GatewayMetrics::incr(&self.metrics.payload_lookups);

        let payload = match self.fetch_by_point_id(chunk_id).await {
            Some(payload) => Some(payload),
            None => {
                debug!(chunk_id, "point-id fetch missed, scrolling by chunk_id");
                self.scroll_by_chunk_id(chunk_id).await
            }
        };

        if let Some(payload) = &payload {
            self.cache.insert(chunk_id.to_string(), payload.clone());
        }
        payload
    }

    /// Fast path: O(1) fetch by the deterministic point id.
    async fn fetch_by_point_id(&self, chunk_id: &str) -> Option<PointPayload> {
        let body = json!({
            "ids": [point_id(chunk_id).to_string()],
            "with_payload": true,
            "with_vector": false,
        });
        let resp = self
            .http
            .post(self.points_url("/points"))
            .json(&body)
            .send()
            .await;
        match resp {
            Ok(resp) if resp.status().is_success() => {
                let text = resp.text().await.unwrap_or_default();
                parse_payloads(&text).into_iter().next()
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "point fetch rejected");
                None
            }
            Err(e) => {
                warn!(error = %e, "point fetch failed");
                None
            }
        }
    }

    /// Slow path: payload filter scroll.
    async fn scroll_by_chunk_id(&self, chunk_id: &str) -> Option<PointPayload> {
        let body = json!({
            "limit": 1,
            "with_payload": true,
            "with_vector": false,
            "filter": { "must": [ { "key": "chunk_id", "match": { "value": chunk_id } } ] },
        });
        let resp = self
            .http
            .post(self.points_url("/points/scroll"))
            .json(&body)
            .send()
            .await;
        match resp {
            Ok(resp) if resp.status().is_success() => {
                let text = resp.text().await.unwrap_or_default();
                parse_payloads(&text).into_iter().next()
            }
            _ => None,
        }
    }

    /// Readiness probe: is the collection reachable.
    pub async fn ready(&self) -> bool {
        self.http
            .get(self.points_url(""))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
