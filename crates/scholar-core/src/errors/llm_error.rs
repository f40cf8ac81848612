/// Generative provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM network error: {reason}")]
    Network { reason: String },

    #[error("malformed LLM response ({reason}): {body}")]
    MalformedResponse { reason: String, body: String },

    #[error("provider '{provider}' requires an API key")]
    MissingApiKey { provider: String },
}
