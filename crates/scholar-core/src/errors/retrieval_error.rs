/// Retrieval pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("search failed: {reason}")]
    SearchFailed { reason: String },

    #[error("prompt assembly failed: {reason}")]
    PromptFailed { reason: String },
}
