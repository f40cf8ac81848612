//! Chat-completions API binding (OpenAI wire shape).

use serde_json::json;

use scholar_core::config::LlmConfig;
use scholar_core::errors::{LlmError, ScholarResult};
use scholar_core::traits::TextGenerator;

use crate::{build_client, malformed, net_err};

pub struct OpenAiProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
    name: String,
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> ScholarResult<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey {
                provider: "openai".to_string(),
            }
            .into());
        }
        Ok(OpenAiProvider {
            client: build_client(config)?,
            endpoint: format!("{}/v1/chat/completions", config.url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            name: format!("OpenAI-{}", config.model),
        })
    }
}

/// Extract `choices[0].message.content`, surfacing server-side errors.
pub(crate) fn parse_chat_body(body: &str) -> ScholarResult<String> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| malformed(&format!("invalid JSON: {e}"), body))?;
    if let Some(error) = value.get("error") {
        return Err(malformed(&format!("API error: {error}"), body));
    }
    value
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| malformed("missing choices[0].message.content", body))
}

impl TextGenerator for OpenAiProvider {
    fn generate(&self, prompt: &str, max_tokens: u32) -> ScholarResult<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "temperature": self.temperature,
            "messages": [ { "role": "user", "content": prompt } ],
        });
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(net_err)?;
        let text = resp.text().map_err(net_err)?;
        parse_chat_body(&text)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
