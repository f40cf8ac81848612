//! In-flight retrieval records returned by the dense index.

use serde::{Deserialize, Serialize};

/// Projection of a chunk's essentials stored alongside its vector point.
///
/// `chunk_type` stays a raw string here: payloads written by older
/// ingestion runs may carry spellings outside the closed set, and the
/// gateway only ever compares it case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointPayload {
    pub chunk_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub chunk_type: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl PointPayload {
    /// Case-insensitive chunk-type comparison, tolerant of `_` vs `-`.
    pub fn is_type(&self, wanted: &str) -> bool {
        self.chunk_type.replace('_', "-").eq_ignore_ascii_case(wanted)
    }
}

/// One in-flight retrieval record.
///
/// `id` is the vector point id for dense hits and the chunk id for shell
/// candidates created from lexical hits. After merge+hydrate, every
/// candidate entering MMR has a vector unless the point is gone from the
/// store.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub score: f64,
    pub vector: Option<Vec<f32>>,
    pub payload: Option<PointPayload>,
}

impl Candidate {
    /// Shell candidate for a lexical hit awaiting hydration.
    pub fn shell(chunk_id: &str) -> Self {
        Candidate {
            id: chunk_id.to_string(),
            score: 0.0,
            vector: None,
            payload: None,
        }
    }

    /// The chunk id this candidate stands for: the payload's `chunk_id`
    /// when hydrated, the raw id otherwise.
    pub fn chunk_id(&self) -> &str {
        self.payload
            .as_ref()
            .map(|p| p.chunk_id.as_str())
            .unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_prefers_payload() {
        let mut c = Candidate::shell("TOPIC-3");
        assert_eq!(c.chunk_id(), "TOPIC-3");
        c.payload = Some(PointPayload {
            chunk_id: "TOPIC-4".into(),
            title: String::new(),
            chunk_type: String::new(),
            metadata: serde_json::Value::Null,
        });
        assert_eq!(c.chunk_id(), "TOPIC-4");
    }

    #[test]
    fn payload_type_check_tolerates_spelling() {
        let p = PointPayload {
            chunk_id: "X".into(),
            title: String::new(),
            chunk_type: "SQL_RESULT".into(),
            metadata: serde_json::Value::Null,
        };
        assert!(p.is_type("sql-result"));
        assert!(!p.is_type("course"));
    }
}
