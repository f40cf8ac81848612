use serde::{Deserialize, Serialize};

use super::{env_or, env_or_str};
use crate::constants::EMBEDDING_DIMENSIONS;

/// Vector store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseIndexConfig {
    pub url: String,
    pub collection: String,
    /// Vector dimensionality of the collection.
    pub dimensions: usize,
    /// Connect timeout, seconds.
    pub connect_timeout_secs: u64,
    /// Per-call read timeout, seconds.
    pub read_timeout_secs: u64,
}

impl Default for DenseIndexConfig {
    fn default() -> Self {
        DenseIndexConfig {
            url: "http://localhost:6333".to_string(),
            collection: "learning_chunks".to_string(),
            dimensions: EMBEDDING_DIMENSIONS,
            connect_timeout_secs: 30,
            read_timeout_secs: 10,
        }
    }
}

impl DenseIndexConfig {
    pub fn from_env() -> Self {
        let d = DenseIndexConfig::default();
        DenseIndexConfig {
            url: env_or_str("QDRANT_URL", &d.url),
            collection: env_or_str("QDRANT_COLLECTION", &d.collection),
            dimensions: env_or("EMBEDDING_DIM", d.dimensions),
            ..d
        }
    }
}

/// Lexical index location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalIndexConfig {
    pub index_dir: String,
}

impl Default for LexicalIndexConfig {
    fn default() -> Self {
        LexicalIndexConfig {
            index_dir: "lexical_index".to_string(),
        }
    }
}

impl LexicalIndexConfig {
    pub fn from_env() -> Self {
        LexicalIndexConfig {
            index_dir: env_or_str("LEXICAL_INDEX_DIR", &LexicalIndexConfig::default().index_dir),
        }
    }
}
