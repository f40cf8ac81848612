use serde::{Deserialize, Serialize};

use super::{env_or, env_or_str};

/// Generative provider selection and tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: `llama` (default), `openai`, or `custom_http`.
    pub provider: String,
    pub url: String,
    /// Model name, used by the chat-style provider.
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// API key for providers that need one. Empty means unset.
    pub api_key: String,
    /// Connect timeout, seconds.
    pub connect_timeout_secs: u64,
    /// Read timeout, seconds. Generation can take a long time.
    pub read_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            provider: "llama".to_string(),
            url: "http://localhost:8081".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.2,
            max_tokens: 300,
            api_key: String::new(),
            connect_timeout_secs: 30,
            read_timeout_secs: 180,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let d = LlmConfig::default();
        LlmConfig {
            provider: env_or_str("LLM_PROVIDER", &d.provider),
            url: env_or_str("LLM_URL", &d.url),
            model: env_or_str("LLM_MODEL", &d.model),
            temperature: env_or("LLM_TEMPERATURE", d.temperature),
            max_tokens: env_or("LLM_MAX_TOKENS", d.max_tokens),
            api_key: env_or_str("LLM_API_KEY", ""),
            ..d
        }
    }
}
