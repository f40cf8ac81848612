use crate::errors::ScholarResult;

/// Provider-agnostic text completion.
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the prompt, bounded by `max_tokens`.
    /// Network failures are retryable; malformed responses are not.
    fn generate(&self, prompt: &str, max_tokens: u32) -> ScholarResult<String>;

    /// Provider name for logging and diagnostics.
    fn name(&self) -> &str;
}
