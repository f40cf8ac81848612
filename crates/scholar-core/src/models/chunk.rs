//! The unit of retrievable evidence.

use serde::{Deserialize, Serialize};

use crate::constants::SQL_CHUNK_PREFIX;

/// Closed set of chunk kinds. Kebab-case on the wire; the underscore forms
/// written by older ingestion runs are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkType {
    Course,
    Topic,
    #[serde(alias = "topic_summary")]
    TopicSummary,
    Class,
    Assignment,
    #[serde(alias = "sql_result")]
    SqlResult,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Course => "course",
            ChunkType::Topic => "topic",
            ChunkType::TopicSummary => "topic-summary",
            ChunkType::Class => "class",
            ChunkType::Assignment => "assignment",
            ChunkType::SqlResult => "sql-result",
        }
    }

    /// Parse a stored chunk-type value, tolerating underscore spellings.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "course" => Some(ChunkType::Course),
            "topic" => Some(ChunkType::Topic),
            "topic-summary" | "topic_summary" => Some(ChunkType::TopicSummary),
            "class" => Some(ChunkType::Class),
            "assignment" => Some(ChunkType::Assignment),
            "sql-result" | "sql_result" => Some(ChunkType::SqlResult),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An atomic unit of retrievable evidence with a stable identifier.
///
/// `chunk_id` is unique within the corpus and is the identifier used by
/// retrieval, citations, and deterministic point ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub chunk_type: ChunkType,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Chunk {
    /// Build a synthetic chunk carrying a relational query result.
    /// The id is prefixed `SQL-` so downstream stages can detect it.
    pub fn sql_result(id_suffix: &str, title: &str, body: &str) -> Self {
        Chunk {
            chunk_id: format!("{SQL_CHUNK_PREFIX}{id_suffix}"),
            chunk_type: ChunkType::SqlResult,
            title: title.to_string(),
            text: body.to_string(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Whether this chunk was produced by the relational path.
    pub fn is_sql_result(&self) -> bool {
        self.chunk_id.starts_with(SQL_CHUNK_PREFIX)
    }
}
