//! Configuration: plain structs with sensible defaults, overridable from
//! the environment. Every tunable named in the deployment docs maps to
//! exactly one field here.

pub mod embedding_config;
pub mod gateway_config;
pub mod index_config;
pub mod llm_config;
pub mod prompt_config;
pub mod retrieval_config;
pub mod storage_config;

pub use embedding_config::EmbeddingConfig;
pub use gateway_config::GatewayConfig;
pub use index_config::{DenseIndexConfig, LexicalIndexConfig};
pub use llm_config::LlmConfig;
pub use prompt_config::PromptConfig;
pub use retrieval_config::RetrievalConfig;
pub use storage_config::StorageConfig;

use std::str::FromStr;

/// Read an environment variable, falling back to `default` when unset,
/// blank, or unparseable.
pub(crate) fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// Read a string environment variable with a fallback.
pub(crate) fn env_or_str(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// Full engine configuration, one section per subsystem.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScholarConfig {
    pub retrieval: RetrievalConfig,
    pub prompt: PromptConfig,
    pub llm: LlmConfig,
    pub dense: DenseIndexConfig,
    pub lexical: LexicalIndexConfig,
    pub embedding: EmbeddingConfig,
    pub storage: StorageConfig,
}

impl ScholarConfig {
    /// Load every section from the environment.
    pub fn from_env() -> Self {
        ScholarConfig {
            retrieval: RetrievalConfig::from_env(),
            prompt: PromptConfig::from_env(),
            llm: LlmConfig::from_env(),
            dense: DenseIndexConfig::from_env(),
            lexical: LexicalIndexConfig::from_env(),
            embedding: EmbeddingConfig::from_env(),
            storage: StorageConfig::from_env(),
        }
    }
}
