//! Error handling for scholar.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod embedding_error;
pub mod gateway_error;
pub mod index_error;
pub mod llm_error;
pub mod retrieval_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use embedding_error::EmbeddingError;
pub use gateway_error::GatewayError;
pub use index_error::IndexError;
pub use llm_error::LlmError;
pub use retrieval_error::RetrievalError;
pub use storage_error::StorageError;

/// Top-level error type unifying every subsystem.
#[derive(Debug, thiserror::Error)]
pub enum ScholarError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ScholarResult<T> = Result<T, ScholarError>;
