//! Canonical strings and fixed defaults shared across the workspace.

/// Canned reply for greeting-intent queries. Retrieval is skipped entirely.
pub const GREETING_ANSWER: &str = "Hello! How can I help you with your learning topics today?";

/// Exact refusal sentence the strict prompt demands when evidence is
/// insufficient. The verifier matches this string verbatim.
pub const REFUSAL_ANSWER: &str = "I don't have that information in your database.";

/// Prefix prepended (outside the prompt) to lenient-mode answers.
pub const LOW_CONFIDENCE_PREFIX: &str = "I couldn't find a matching authoritative record in your database. Based on semantic evidence (low confidence), ";

/// Identifier prefix for synthetic chunks produced by the relational path.
pub const SQL_CHUNK_PREFIX: &str = "SQL-";

/// Embedding dimensionality of the bi-encoder.
pub const EMBEDDING_DIMENSIONS: usize = 768;

/// Runtime cap on subword sequence length fed to the bi-encoder.
pub const EMBED_MAX_SEQ_LEN: usize = 384;

/// Hard cap on (query, doc) pair length for the cross-encoder.
pub const CROSS_ENCODER_MAX_SEQ_LEN: usize = 512;

/// Character floor used when a chunk must be truncated to fit the prompt.
pub const PROMPT_MIN_CHAR_BUDGET: usize = 80;

/// Character budget for the top chunk when nothing else fits at all.
pub const PROMPT_FALLBACK_CHAR_BUDGET: usize = 512;

/// Batch size for the ingest embedding loop.
pub const INGEST_BATCH_SIZE: usize = 8;

/// How many source ids the gateway inspects when refreshing session state.
pub const SESSION_SOURCE_WINDOW: usize = 5;

/// Queries at or under this many whitespace tokens are follow-up candidates.
pub const FOLLOW_UP_MAX_TOKENS: usize = 7;
