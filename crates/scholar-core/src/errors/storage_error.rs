/// Relational store errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {message}")]
    Sqlite { message: String },

    #[error("read pool lock poisoned: {reason}")]
    PoolPoisoned { reason: String },

    #[error("unknown chunk type '{value}' for chunk {chunk_id}")]
    UnknownChunkType { chunk_id: String, value: String },
}
