//! # scholar-llm
//!
//! Concrete [`TextGenerator`] providers and the config-driven factory.
//! Three bindings: a local llama.cpp completion server, a chat-style API,
//! and a generic HTTP endpoint that tolerates several response field names.
//!
//! [`TextGenerator`]: scholar_core::traits::TextGenerator

pub mod custom_http;
pub mod factory;
pub mod llama_cpp;
pub mod openai;

pub use custom_http::CustomHttpProvider;
pub use factory::create_provider;
pub use llama_cpp::LlamaCppProvider;
pub use openai::OpenAiProvider;

use std::time::Duration;

use scholar_core::config::LlmConfig;
use scholar_core::errors::{LlmError, ScholarResult};

/// Shared blocking client with the generative-call timeouts.
pub(crate) fn build_client(config: &LlmConfig) -> ScholarResult<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.read_timeout_secs))
        .build()
        .map_err(|e| {
            LlmError::Network {
                reason: e.to_string(),
            }
            .into()
        })
}

pub(crate) fn net_err(e: impl std::fmt::Display) -> scholar_core::errors::ScholarError {
    LlmError::Network {
        reason: e.to_string(),
    }
    .into()
}

pub(crate) fn malformed(reason: &str, body: &str) -> scholar_core::errors::ScholarError {
    LlmError::MalformedResponse {
        reason: reason.to_string(),
        body: body.to_string(),
    }
    .into()
}
