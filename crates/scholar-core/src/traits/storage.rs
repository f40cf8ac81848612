use std::collections::HashMap;

use crate::errors::ScholarResult;
use crate::models::{Chunk, CodeTitle, DateRange};

/// Source of truth for chunk text and metadata.
pub trait ChunkStore: Send + Sync {
    /// Fetch full chunk rows by id. Missing ids are simply absent from the
    /// returned map.
    fn fetch_chunks(&self, chunk_ids: &[String]) -> ScholarResult<HashMap<String, Chunk>>;
}

/// The closed set of deterministic relational reads the router attempts,
/// in order, for factual queries.
pub trait CurriculumStore: Send + Sync {
    fn list_courses(&self) -> ScholarResult<Vec<CodeTitle>>;

    fn list_topics(&self) -> ScholarResult<Vec<CodeTitle>>;

    /// MIN/MAX `learned_at` over the classes of a topic code, `None` when
    /// the topic is unknown or has no classes.
    fn learned_at_range(&self, topic_code: &str) -> ScholarResult<Option<DateRange>>;

    /// Class count for a topic code, `None` when the topic is unknown.
    fn count_classes_for_topic(&self, topic_code: &str) -> ScholarResult<Option<u32>>;
}
