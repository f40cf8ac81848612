//! Config-driven provider selection.

use tracing::{info, warn};

use scholar_core::config::LlmConfig;
use scholar_core::errors::ScholarResult;
use scholar_core::traits::TextGenerator;

use crate::{CustomHttpProvider, LlamaCppProvider, OpenAiProvider};

/// Create the provider named by `config.provider`.
/// Unknown names fall back to the llama.cpp default.
pub fn create_provider(config: &LlmConfig) -> ScholarResult<Box<dyn TextGenerator>> {
    let name = config.provider.trim().to_lowercase();
    match name.as_str() {
        "llama" | "llama_cpp" | "llamacpp" => {
            info!(url = %config.url, "using LlamaCpp provider");
            Ok(Box::new(LlamaCppProvider::new(config)?))
        }
        "openai" | "gpt" => {
            info!(model = %config.model, "using OpenAI provider");
            Ok(Box::new(OpenAiProvider::new(config)?))
        }
        "custom_http" | "custom" | "http" => {
            info!(url = %config.url, "using CustomHttp provider");
            Ok(Box::new(CustomHttpProvider::new(config)?))
        }
        other => {
            warn!(provider = other, "unknown LLM provider, falling back to llama");
            Ok(Box::new(LlamaCppProvider::new(config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_providers_resolve() {
        let mut config = LlmConfig::default();
        for (name, expected) in [
            ("llama", "LlamaCpp"),
            ("llamacpp", "LlamaCpp"),
            ("custom_http", "CustomHttp"),
            ("definitely-not-a-provider", "LlamaCpp"),
        ] {
            config.provider = name.to_string();
            assert_eq!(create_provider(&config).unwrap().name(), expected);
        }
    }

    #[test]
    fn openai_requires_api_key() {
        let mut config = LlmConfig::default();
        config.provider = "openai".to_string();
        assert!(create_provider(&config).is_err());
        config.api_key = "sk-test".to_string();
        assert_eq!(create_provider(&config).unwrap().name(), "OpenAI-gpt-3.5-turbo");
    }
}
