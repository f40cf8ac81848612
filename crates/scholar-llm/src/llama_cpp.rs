//! llama.cpp completion server binding. The default provider.

use serde_json::json;

use scholar_core::config::LlmConfig;
use scholar_core::errors::ScholarResult;
use scholar_core::traits::TextGenerator;

use crate::{build_client, malformed, net_err};

pub struct LlamaCppProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    temperature: f64,
}

impl LlamaCppProvider {
    pub fn new(config: &LlmConfig) -> ScholarResult<Self> {
        Ok(LlamaCppProvider {
            client: build_client(config)?,
            endpoint: format!("{}/completion", config.url.trim_end_matches('/')),
            temperature: config.temperature,
        })
    }
}

/// Extract the completion text from a llama.cpp response body.
pub(crate) fn parse_completion_body(body: &str) -> ScholarResult<String> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| malformed(&format!("invalid JSON: {e}"), body))?;
    value
        .get("content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| malformed("missing 'content' field", body))
}

impl TextGenerator for LlamaCppProvider {
    fn generate(&self, prompt: &str, max_tokens: u32) -> ScholarResult<String> {
        let body = json!({
            "prompt": prompt,
            "n_predict": max_tokens,
            "temperature": self.temperature,
        });
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(net_err)?;
        let status = resp.status();
        let text = resp.text().map_err(net_err)?;
        if !status.is_success() {
            return Err(malformed(&format!("HTTP {status}"), &text));
        }
        parse_completion_body(&text)
    }

    fn name(&self) -> &str {
        "LlamaCpp"
    }
}
