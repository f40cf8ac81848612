//! Pattern-based intent classification and topic-code extraction.

use regex::Regex;
use std::sync::OnceLock;

use scholar_core::intent::Intent;

const FACTUAL_CUES: [&str; 5] = ["list", "count", "how many", "what are the", "which"];
const SEMANTIC_CUES: [&str; 4] = ["describe", "explain", "summarize", "tell me about"];
const ENTITY_TOKENS: [&str; 5] = ["topic", "course", "class", "assignment", "instructor"];

fn greeting_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(hi|hello|hey|howdy|yo|good\s+(morning|afternoon|evening))[\s!.?]*$")
            .expect("greeting regex")
    })
}

fn topic_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bC\d+-T\d+\b").expect("topic code regex"))
}

/// First `C<digits>-T<digits>` identifier in the query, upper-cased.
pub fn extract_topic_code(query: &str) -> Option<String> {
    topic_code_re()
        .find(query)
        .map(|m| m.as_str().to_uppercase())
}

fn has_factual_cue(q: &str) -> bool {
    FACTUAL_CUES.iter().any(|cue| q.contains(cue))
}

fn has_semantic_cue(q: &str) -> bool {
    SEMANTIC_CUES.iter().any(|cue| q.contains(cue))
}

fn has_entity_token(q: &str) -> bool {
    extract_topic_code(q).is_some() || ENTITY_TOKENS.iter().any(|t| q.contains(t))
}

/// Ordered pattern tests: greeting, then factual/semantic cue combination.
/// Both kinds of cue present → Mixed; neither → Mixed (the fused path is
/// the safe default).
pub fn classify(query: &str) -> Intent {
    let trimmed = query.trim();
    if greeting_re().is_match(trimmed) {
        return Intent::Greeting;
    }
    let q = trimmed.to_lowercase();
    let factual = has_factual_cue(&q) || (q.contains("when") && has_entity_token(&q));
    let semantic = has_semantic_cue(&q);
    match (factual, semantic) {
        (true, true) => Intent::Mixed,
        (true, false) => Intent::Factual,
        (false, true) => Intent::Semantic,
        (false, false) => Intent::Mixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_match_short_openers_only() {
        for q in ["hello", "Hi!", "hey", "Good morning", "yo"] {
            assert_eq!(classify(q), Intent::Greeting, "query: {q}");
        }
        assert_ne!(classify("hello, how many classes for C1-T1?"), Intent::Greeting);
    }

    #[test]
    fn enumeration_cues_are_factual() {
        for q in [
            "How many classes for C1-T1?",
            "list courses",
            "Which topics have the most assignments?",
            "What are the topics in C2?",
        ] {
            assert_eq!(classify(q), Intent::Factual, "query: {q}");
        }
    }

    #[test]
    fn temporal_cue_with_entity_is_factual() {
        assert_eq!(classify("When did I learn C2-T3?"), Intent::Factual);
        assert_eq!(classify("When is the next class?"), Intent::Factual);
    }

    #[test]
    fn explanation_cues_are_semantic() {
        for q in [
            "Describe each course",
            "Explain binary search",
            "Tell me about Databases and SQL",
            "summarize C1-T2",
        ] {
            assert_eq!(classify(q), Intent::Semantic, "query: {q}");
        }
    }

    #[test]
    fn combined_cues_and_fallback_are_mixed() {
        assert_eq!(classify("List my courses and explain each"), Intent::Mixed);
        assert_eq!(classify("binary search trees"), Intent::Mixed);
    }

    #[test]
    fn topic_code_extraction_normalizes_case() {
        assert_eq!(extract_topic_code("when did I learn c2-t3?"), Some("C2-T3".into()));
        assert_eq!(
            extract_topic_code("compare C1-T1 and C1-T2"),
            Some("C1-T1".into())
        );
        assert_eq!(extract_topic_code("no code here"), None);
    }
}
