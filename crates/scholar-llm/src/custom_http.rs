//! Generic HTTP binding for a customer-supplied LLM endpoint.
//!
//! Contract: POST `{ prompt, max_tokens, temperature }` with an optional
//! bearer key; the completion may come back under any of several common
//! field names.

use serde_json::json;

use scholar_core::config::LlmConfig;
use scholar_core::errors::ScholarResult;
use scholar_core::traits::TextGenerator;

use crate::{build_client, malformed, net_err};

const RESPONSE_FIELDS: [&str; 5] = ["text", "content", "response", "output", "generated_text"];

pub struct CustomHttpProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    temperature: f64,
}

impl CustomHttpProvider {
    pub fn new(config: &LlmConfig) -> ScholarResult<Self> {
        Ok(CustomHttpProvider {
            client: build_client(config)?,
            endpoint: config.url.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
        })
    }
}

/// Try each known completion field in order.
pub(crate) fn parse_generic_body(body: &str) -> ScholarResult<String> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| malformed(&format!("invalid JSON: {e}"), body))?;
    for field in RESPONSE_FIELDS {
        if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
            return Ok(text.to_string());
        }
    }
    Err(malformed("no recognized completion field", body))
}

impl TextGenerator for CustomHttpProvider {
    fn generate(&self, prompt: &str, max_tokens: u32) -> ScholarResult<String> {
        let body = json!({
            "prompt": prompt,
            "max_tokens": max_tokens,
            "temperature": self.temperature,
        });
        let mut req = self.client.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }
        let resp = req.send().map_err(net_err)?;
        let status = resp.status();
        let text = resp.text().map_err(net_err)?;
        if !status.is_success() {
            return Err(malformed(&format!("HTTP {status}"), &text));
        }
        parse_generic_body(&text)
    }

    fn name(&self) -> &str {
        "CustomHttp"
    }
}
