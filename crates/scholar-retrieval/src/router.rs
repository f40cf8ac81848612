//! Deterministic relational routing for factual queries.
//!
//! A closed set of reads is attempted in order: list-courses, list-topics,
//! learned-at-range (for a recognized topic code), count-classes. A hit
//! produces the authoritative answer sentence, a synthetic `SQL-` chunk
//! carrying the result, and the query text for display.

use chrono::NaiveDateTime;
use tracing::debug;

use scholar_core::errors::ScholarResult;
use scholar_core::models::{Chunk, DateRange};
use scholar_core::traits::CurriculumStore;

use crate::intent::extract_topic_code;

/// A successful deterministic lookup.
#[derive(Debug, Clone)]
pub struct FactualHit {
    pub chunk: Chunk,
    pub answer: String,
    pub sql: String,
}

const LIST_CUES: [&str; 7] = ["list", "what are", "which", "show", "all", "how many", "count"];

fn has_list_cue(q: &str) -> bool {
    LIST_CUES.iter().any(|cue| q.contains(cue))
}

fn iso(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// "June 21, 2025" style rendering for single-day ranges.
fn long_date(date: chrono::NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn learned_answer(topic: &str, range: &DateRange) -> String {
    if let Some(day) = range.single_day() {
        return format!("You learned {topic} on {}.", long_date(day));
    }
    match (range.earliest, range.latest) {
        (Some(e), Some(l)) => format!("You learned {topic} between {} and {}.", iso(e), iso(l)),
        (Some(e), None) => format!("You learned {topic} starting {}.", iso(e)),
        (None, Some(l)) => format!("You learned {topic} until {}.", iso(l)),
        (None, None) => format!("You have no recorded classes for {topic}."),
    }
}

/// Try the deterministic reads in their canonical order.
pub fn try_deterministic(
    curriculum: &dyn CurriculumStore,
    query: &str,
) -> ScholarResult<Option<FactualHit>> {
    let q = query.to_lowercase();
    let topic = extract_topic_code(query);

    if q.contains("course") && has_list_cue(&q) {
        let rows = curriculum.list_courses()?;
        if !rows.is_empty() {
            let listing = rows
                .iter()
                .map(|r| format!("{} ({})", r.code, r.title))
                .collect::<Vec<_>>()
                .join("; ");
            let body = std::iter::once("SQL_RESULT for courses".to_string())
                .chain(rows.iter().map(|r| format!("{}: {}", r.code, r.title)))
                .collect::<Vec<_>>()
                .join("\n");
            debug!(rows = rows.len(), "deterministic hit: list courses");
            return Ok(Some(FactualHit {
                chunk: Chunk::sql_result("list_courses", "Course list", &body),
                answer: format!("You have {} courses: {listing}.", rows.len()),
                sql: "SELECT code, title FROM courses ORDER BY code".to_string(),
            }));
        }
    }

    if q.contains("topic") && has_list_cue(&q) && topic.is_none() {
        let rows = curriculum.list_topics()?;
        if !rows.is_empty() {
            let listing = rows
                .iter()
                .map(|r| format!("{} ({})", r.code, r.title))
                .collect::<Vec<_>>()
                .join("; ");
            let body = std::iter::once("SQL_RESULT for topics".to_string())
                .chain(rows.iter().map(|r| format!("{}: {}", r.code, r.title)))
                .collect::<Vec<_>>()
                .join("\n");
            debug!(rows = rows.len(), "deterministic hit: list topics");
            return Ok(Some(FactualHit {
                chunk: Chunk::sql_result("list_topics", "Topic list", &body),
                answer: format!("You have {} topics: {listing}.", rows.len()),
                sql: "SELECT code, title FROM topics ORDER BY code".to_string(),
            }));
        }
    }

    if let Some(topic) = &topic {
        if q.contains("when") || q.contains("learn") {
            if let Some(range) = curriculum.learned_at_range(topic)? {
                let mut body = format!("SQL_RESULT for topic={topic}\n");
                if let Some(e) = range.earliest {
                    body.push_str(&format!("earliest: {}\n", iso(e)));
                }
                if let Some(l) = range.latest {
                    body.push_str(&format!("latest: {}\n", iso(l)));
                }
                debug!(topic = %topic, "deterministic hit: learned-at range");
                return Ok(Some(FactualHit {
                    chunk: Chunk::sql_result(
                        &format!("learned_at_{topic}"),
                        &format!("Learned-at range for {topic}"),
                        &body,
                    ),
                    answer: learned_answer(topic, &range),
                    sql: "SELECT MIN(learned_at) AS earliest, MAX(learned_at) AS latest FROM classes WHERE topic_id = ?".to_string(),
                }));
            }
        }

        if q.contains("how many") || q.contains("count") {
            if let Some(count) = curriculum.count_classes_for_topic(topic)? {
                let body = format!("SQL_RESULT for topic={topic}\nTotal classes: {count}\n");
                debug!(topic = %topic, count, "deterministic hit: class count");
                return Ok(Some(FactualHit {
                    chunk: Chunk::sql_result(
                        &format!("count_classes_{topic}"),
                        &format!("Class count for {topic}"),
                        &body,
                    ),
                    answer: format!("You have {count} classes for {topic}."),
                    sql: "SELECT COUNT(*) AS cnt FROM classes WHERE topic_id = ?".to_string(),
                }));
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use scholar_core::models::CodeTitle;

    struct StubCurriculum {
        courses: Vec<CodeTitle>,
        topics: Vec<CodeTitle>,
        range: Option<DateRange>,
        count: Option<u32>,
    }

    impl Default for StubCurriculum {
        fn default() -> Self {
            StubCurriculum {
                courses: vec![
                    CodeTitle {
                        code: "C1".into(),
                        title: "Algorithms".into(),
                    },
                    CodeTitle {
                        code: "C2".into(),
                        title: "Databases and SQL".into(),
                    },
                ],
                topics: vec![CodeTitle {
                    code: "C1-T1".into(),
                    title: "Binary search".into(),
                }],
                range: None,
                count: None,
            }
        }
    }

    impl CurriculumStore for StubCurriculum {
        fn list_courses(&self) -> ScholarResult<Vec<CodeTitle>> {
            Ok(self.courses.clone())
        }
        fn list_topics(&self) -> ScholarResult<Vec<CodeTitle>> {
            Ok(self.topics.clone())
        }
        fn learned_at_range(&self, _: &str) -> ScholarResult<Option<DateRange>> {
            Ok(self.range.clone())
        }
        fn count_classes_for_topic(&self, _: &str) -> ScholarResult<Option<u32>> {
            Ok(self.count)
        }
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn class_count_produces_sentence_and_sql_chunk() {
        let curriculum = StubCurriculum {
            count: Some(5),
            ..Default::default()
        };
        let hit = try_deterministic(&curriculum, "How many classes for C1-T1?")
            .unwrap()
            .expect("hit");
        assert_eq!(hit.answer, "You have 5 classes for C1-T1.");
        assert_eq!(hit.chunk.chunk_id, "SQL-count_classes_C1-T1");
        assert!(hit.chunk.text.contains("Total classes: 5"));
        assert!(hit.sql.contains("COUNT(*)"));
    }

    #[test]
    fn single_day_range_renders_long_date() {
        let curriculum = StubCurriculum {
            range: Some(DateRange {
                earliest: Some(dt("2025-06-21T00:00:00")),
                latest: Some(dt("2025-06-21T00:00:00")),
            }),
            ..Default::default()
        };
        let hit = try_deterministic(&curriculum, "When did I learn C2-T3?")
            .unwrap()
            .expect("hit");
        assert_eq!(hit.answer, "You learned C2-T3 on June 21, 2025.");
        assert_eq!(hit.chunk.chunk_id, "SQL-learned_at_C2-T3");
    }

    #[test]
    fn multi_day_range_renders_between() {
        let curriculum = StubCurriculum {
            range: Some(DateRange {
                earliest: Some(dt("2025-05-11T10:00:00")),
                latest: Some(dt("2025-05-15T10:00:00")),
            }),
            ..Default::default()
        };
        let hit = try_deterministic(&curriculum, "when did i learn c1-t1")
            .unwrap()
            .expect("hit");
        assert_eq!(
            hit.answer,
            "You learned C1-T1 between 2025-05-11T10:00:00 and 2025-05-15T10:00:00."
        );
    }

    #[test]
    fn course_listing_matches_list_cues() {
        let hit = try_deterministic(&StubCurriculum::default(), "list my courses")
            .unwrap()
            .expect("hit");
        assert_eq!(hit.chunk.chunk_id, "SQL-list_courses");
        assert_eq!(
            hit.answer,
            "You have 2 courses: C1 (Algorithms); C2 (Databases and SQL)."
        );
    }

    #[test]
    fn topic_listing_skipped_when_code_present() {
        // A topic-code query is about one topic, not the listing.
        let curriculum = StubCurriculum {
            count: Some(2),
            ..Default::default()
        };
        let hit = try_deterministic(&curriculum, "how many classes for topic C1-T1")
            .unwrap()
            .expect("hit");
        assert_eq!(hit.chunk.chunk_id, "SQL-count_classes_C1-T1");
    }

    #[test]
    fn no_relational_match_yields_none() {
        let curriculum = StubCurriculum {
            courses: Vec::new(),
            topics: Vec::new(),
            ..Default::default()
        };
        assert!(try_deterministic(&curriculum, "How many moons in our syllabus?")
            .unwrap()
            .is_none());
        assert!(try_deterministic(&StubCurriculum::default(), "describe binary search")
            .unwrap()
            .is_none());
    }

    #[test]
    fn long_date_has_no_zero_padding() {
        assert_eq!(
            long_date(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
            "June 1, 2025"
        );
    }
}
