use serde::{Deserialize, Serialize};

use super::{env_or, env_or_str};

/// Session gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub listen_addr: String,
    /// Backend query API base URL.
    pub backend_url: String,
    /// Vector store used for payload resolution.
    pub qdrant_url: String,
    pub qdrant_collection: String,
    /// Session TTL, refreshed on every interaction.
    pub session_ttl_secs: u64,
    pub payload_cache_max: u64,
    pub payload_cache_ttl_secs: u64,
    /// Backend forward timeout.
    pub forward_timeout_secs: u64,
    /// When set, sessions persist in a shared SQLite store at this path
    /// instead of the in-process map.
    pub session_store_path: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            listen_addr: "0.0.0.0:8088".to_string(),
            backend_url: "http://localhost:8080".to_string(),
            qdrant_url: "http://localhost:6333".to_string(),
            qdrant_collection: "learning_chunks".to_string(),
            session_ttl_secs: 900,
            payload_cache_max: 1000,
            payload_cache_ttl_secs: 300,
            forward_timeout_secs: 120,
            session_store_path: None,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let d = GatewayConfig::default();
        GatewayConfig {
            listen_addr: env_or_str("GATEWAY_LISTEN_ADDR", &d.listen_addr),
            backend_url: env_or_str("BACKEND_URL", &d.backend_url),
            qdrant_url: env_or_str("QDRANT_URL", &d.qdrant_url),
            qdrant_collection: env_or_str("QDRANT_COLLECTION", &d.qdrant_collection),
            session_ttl_secs: env_or("SESSION_TTL_SEC", d.session_ttl_secs),
            payload_cache_max: env_or("PAYLOAD_CACHE_MAX", d.payload_cache_max),
            payload_cache_ttl_secs: env_or("PAYLOAD_CACHE_TTL_SEC", d.payload_cache_ttl_secs),
            forward_timeout_secs: env_or("BACKEND_TIMEOUT_SEC", d.forward_timeout_secs),
            session_store_path: std::env::var("SESSION_STORE_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }
}
