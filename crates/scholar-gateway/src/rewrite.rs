//! Follow-up detection and reference rewriting.
//!
//! A query is a follow-up candidate when it contains a singular
//! third-person reference or is short (≤ 7 tokens). Plural references
//! ("they", "them", "those") are deliberately not rewritable: they rarely
//! map to a single prior entity.

use regex::Regex;
use std::sync::OnceLock;

use scholar_core::constants::FOLLOW_UP_MAX_TOKENS;

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(its|it|this|that)\b").expect("reference regex"))
}

/// Whether the query carries a singular third-person reference.
pub fn has_singular_reference(query: &str) -> bool {
    reference_re().is_match(query)
}

/// Follow-up candidate: singular reference or at most 7 tokens.
pub fn is_follow_up(query: &str) -> bool {
    has_singular_reference(query) || query.split_whitespace().count() <= FOLLOW_UP_MAX_TOKENS
}

/// Replace every singular reference token with `entity_name`.
/// Identity when the query contains none.
pub fn rewrite_query(query: &str, entity_name: &str) -> String {
    reference_re().replace_all(query, entity_name).into_owned()
}

/// Whether the query asks about the schedule of a course.
pub fn asks_about_course_schedule(query: &str) -> bool {
    let q = query.to_lowercase();
    let schedule_cue = ["when", "offered", "schedule", "start", "end", "run"]
        .iter()
        .any(|cue| q.contains(cue));
    q.contains("course") && schedule_cue
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn singular_references_are_detected() {
        assert!(has_singular_reference("When is it offered?"));
        assert!(has_singular_reference("Tell me more about this"));
        assert!(has_singular_reference("What are its prerequisites?"));
        assert!(!has_singular_reference("When are they offered?"));
        assert!(!has_singular_reference("Describe those topics"));
    }

    #[test]
    fn short_queries_count_as_follow_ups() {
        assert!(is_follow_up("and the prerequisites?"));
        assert!(!is_follow_up(
            "Please give me a complete overview of every course in the catalog this term"
        ));
    }

    #[test]
    fn rewrite_substitutes_each_reference() {
        assert_eq!(
            rewrite_query("When is it offered?", "Databases and SQL"),
            "When is Databases and SQL offered?"
        );
        assert_eq!(
            rewrite_query("Is that hard? Explain it.", "Binary search"),
            "Is Binary search hard? Explain Binary search."
        );
    }

    #[test]
    fn rewrite_is_identity_without_references() {
        let q = "When are the assignments due?";
        assert_eq!(rewrite_query(q, "Databases"), q);
    }

    #[test]
    fn reference_must_be_a_whole_word() {
        // "commit" and "itself" contain "it" but are not references.
        let q = "commit itself thoroughly";
        assert_eq!(rewrite_query(q, "X"), q);
    }

    #[test]
    fn course_schedule_questions_are_detected() {
        assert!(asks_about_course_schedule("When is the course offered?"));
        assert!(asks_about_course_schedule("what is the course schedule"));
        assert!(!asks_about_course_schedule("When is the exam?"));
        assert!(!asks_about_course_schedule("Describe the course content"));
    }

    proptest! {
        /// Identity round-trip: no reference tokens → no change; with
        /// reference tokens → none survive the rewrite.
        #[test]
        fn rewrite_round_trip(words in prop::collection::vec("[a-z]{1,8}", 1..12)) {
            let query = words.join(" ");
            let rewritten = rewrite_query(&query, "ENTITY");
            if has_singular_reference(&query) {
                prop_assert!(!has_singular_reference(&rewritten));
                prop_assert!(rewritten.contains("ENTITY"));
            } else {
                prop_assert_eq!(rewritten, query);
            }
        }
    }
}
