/// Embedding subsystem errors (bi-encoder and cross-encoder).
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("failed to load model at {path}: {reason}")]
    ModelLoadFailed { path: String, reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
