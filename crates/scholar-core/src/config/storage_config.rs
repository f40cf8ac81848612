use serde::{Deserialize, Serialize};

use super::{env_or, env_or_str};

/// Relational store location and pool size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub read_pool_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            db_path: "scholar.db".to_string(),
            read_pool_size: 4,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let d = StorageConfig::default();
        StorageConfig {
            db_path: env_or_str("DB_PATH", &d.db_path),
            read_pool_size: env_or("DB_READ_POOL_SIZE", d.read_pool_size),
        }
    }
}
