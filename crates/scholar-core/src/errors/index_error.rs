/// Dense and lexical index errors.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("vector store transport error: {reason}")]
    Transport { reason: String },

    #[error("vector store returned {status}: {body}")]
    BadResponse { status: u16, body: String },

    #[error("failed to decode vector store response: {reason}")]
    Decode { reason: String },

    #[error("lexical index error: {reason}")]
    Lexical { reason: String },
}
