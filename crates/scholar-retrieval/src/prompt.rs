//! Tokenizer-aware budgeted prompt construction.
//!
//! Evidence gets `max_tokens − reserved_answer − overhead` tokens (less
//! the rendered history). Chunks are included whole when they fit;
//! otherwise the body is truncated with a head+tail rule that first pulls
//! out fact lines (totals, learned-at, due dates, created timestamps) and
//! keeps them verbatim.

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use scholar_core::config::PromptConfig;
use scholar_core::constants::{PROMPT_FALLBACK_CHAR_BUDGET, PROMPT_MIN_CHAR_BUDGET, REFUSAL_ANSWER};
use scholar_core::models::{Chunk, ConversationTurn};
use scholar_core::traits::TokenCounter;

fn fact_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(total\s+classes|total\s+assignments|learned at|due[ _]date|created at)[:\s]")
            .expect("fact line regex")
    })
}

fn take_prefix(s: &str, chars: usize) -> &str {
    match s.char_indices().nth(chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn take_suffix(s: &str, chars: usize) -> &str {
    let len = s.chars().count();
    if len <= chars {
        return s;
    }
    match s.char_indices().nth(len - chars) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// Truncate `text` to roughly `char_budget` characters, preserving fact
/// lines verbatim and splitting the rest between a head prefix and a tail
/// suffix joined by an ellipsis.
pub fn truncate_head_tail_preserve_facts(text: &str, char_budget: usize) -> String {
    if text.chars().count() <= char_budget {
        return text.to_string();
    }
    let mut facts = String::new();
    let mut body = String::new();
    for line in text.lines() {
        if fact_line_re().is_match(line.trim()) {
            facts.push_str(line);
            facts.push('\n');
        } else {
            body.push_str(line);
            body.push('\n');
        }
    }
    let fact_len = facts.chars().count();
    if fact_len >= char_budget {
        // Only the facts fit.
        return take_prefix(&facts, char_budget).to_string();
    }
    let remaining = char_budget - fact_len;
    let body = body.trim();
    if body.chars().count() <= remaining {
        return format!("{facts}{body}");
    }
    let half = remaining / 2;
    format!(
        "{facts}{}\n...\n{}",
        take_prefix(body, half),
        take_suffix(body, half)
    )
}

/// Budgeted prompt builder producing the strict and lenient variants.
pub struct PromptAssembler {
    config: PromptConfig,
    counter: Arc<dyn TokenCounter>,
}

impl PromptAssembler {
    pub fn new(config: PromptConfig, counter: Arc<dyn TokenCounter>) -> Self {
        PromptAssembler { config, counter }
    }

    pub fn config(&self) -> &PromptConfig {
        &self.config
    }

    fn count(&self, text: &str) -> usize {
        self.counter.count_tokens(text)
    }

    fn render_history(&self, history: Option<&[ConversationTurn]>) -> String {
        let Some(turns) = history.filter(|t| !t.is_empty()) else {
            return String::new();
        };
        let start = turns.len().saturating_sub(self.config.history_max_turns);
        let mut out = String::from("[HISTORY]\n");
        for turn in &turns[start..] {
            // Long turns keep their tail: the end of a turn is what the
            // follow-up refers to.
            let content = take_suffix(turn.content.trim(), self.config.history_turn_char_cap);
            out.push_str(&format!("{}: {}\n", turn.role, content));
        }
        out.push('\n');
        out
    }

    /// Assemble the evidence block within `available` tokens.
    fn assemble_evidence(&self, chunks: &[Chunk], context_k: usize, available: usize) -> String {
        let mut evidence = String::new();
        let mut used = 0usize;
        let mut included = 0usize;

        for chunk in chunks {
            if included >= context_k {
                break;
            }
            let header = format!(
                "[CHUNK id={} type={}]\n",
                chunk.chunk_id, chunk.chunk_type
            );
            let header_tokens = self.count(&header);
            let body_tokens = self.count(&chunk.text);

            if used + header_tokens + body_tokens <= available {
                evidence.push_str(&header);
                evidence.push_str(&chunk.text);
                evidence.push_str("\n[/CHUNK]\n\n");
                used += header_tokens + body_tokens;
                included += 1;
                continue;
            }

            // Trim to fit: approximate tokens→chars at 4 chars per token,
            // then recount the trimmed text before committing.
            let remaining_tokens = available.saturating_sub(used + header_tokens);
            let char_budget = (remaining_tokens * 4).max(PROMPT_MIN_CHAR_BUDGET);
            let trimmed = truncate_head_tail_preserve_facts(&chunk.text, char_budget);
            let trimmed_tokens = self.count(&trimmed);
            if !trimmed.is_empty() && used + header_tokens + trimmed_tokens <= available {
                evidence.push_str(&header);
                evidence.push_str(&trimmed);
                evidence.push_str("\n[/CHUNK]\n\n");
                used += header_tokens + trimmed_tokens;
                included += 1;
            } else {
                break;
            }
        }

        if included == 0 {
            if let Some(chunk) = chunks.first() {
                // Nothing fit; still surface the top chunk, hard-truncated.
                let header = format!(
                    "[CHUNK id={} type={}]\n",
                    chunk.chunk_id, chunk.chunk_type
                );
                let trimmed =
                    truncate_head_tail_preserve_facts(&chunk.text, PROMPT_FALLBACK_CHAR_BUDGET);
                evidence.push_str(&header);
                evidence.push_str(&trimmed);
                evidence.push_str("\n[/CHUNK]\n\n");
            }
        }

        debug!(included, used, available, "evidence assembled");
        evidence
    }

    /// Strict variant: every factual sentence must carry a citation, and
    /// the exact refusal sentence is demanded when evidence is missing.
    pub fn build_strict(
        &self,
        chunks: &[Chunk],
        question: &str,
        context_k: usize,
        history: Option<&[ConversationTurn]>,
    ) -> String {
        let history_block = self.render_history(history);
        let available = self
            .config
            .evidence_budget()
            .saturating_sub(self.count(&history_block));
        let evidence = self.assemble_evidence(chunks, context_k, available);

        format!(
            "[SYSTEM]\n\
             You are a factual assistant. You may only use the evidence excerpts provided below to answer the user's question. If the evidence does not support the question, say exactly: \"{REFUSAL_ANSWER}\"\n\n\
             {history_block}\
             [EVIDENCE]\n\
             {evidence}\
             [USER QUESTION]\n\
             {question}\n\n\
             [INSTRUCTIONS]\n\
             1. Answer concisely (1-3 sentences).\n\
             2. Base every factual claim only on the evidence above.\n\
             3. If you state a fact present in the evidence, append the source bracket(s) for that fact: [source: <CHUNK_ID>].\n\
             4. Never invent dates, numbers or facts. If a fact is not present, respond: \"{REFUSAL_ANSWER}\"\n\
             5. If you compute a numeric aggregation, use only numbers explicitly present in the evidence and show the short calculation in square brackets, e.g., \"[calc: 2+3=5]\".\n\
             6. If the question asks for explanation plus fact, put the fact first (with source), then one short explanation sentence that does not include new factual claims.\n\n\
             [OUTPUT FORMAT]\n\
             Answer: <one paragraph (1-3 sentences)>\n\
             Sources: <comma-separated CHUNK_IDs used>\n\
             Optional SQL: <SQL snippet or \"N/A\">\n\n\
             [END]\n"
        )
    }

    /// Lenient variant, used only at low confidence. Best-effort answers
    /// are allowed; the caller prepends the disclaimer outside the prompt.
    pub fn build_lenient(
        &self,
        chunks: &[Chunk],
        question: &str,
        context_k: usize,
        history: Option<&[ConversationTurn]>,
    ) -> String {
        let history_block = self.render_history(history);
        let available = self
            .config
            .evidence_budget()
            .saturating_sub(self.count(&history_block));
        let evidence = self.assemble_evidence(chunks, context_k, available);

        format!(
            "[SYSTEM]\n\
             You are a helpful study assistant. Prefer the evidence excerpts below, but you may answer from general knowledge when they fall short. Keep the answer short and note clearly when it is not grounded in the evidence.\n\n\
             {history_block}\
             [EVIDENCE]\n\
             {evidence}\
             [USER QUESTION]\n\
             {question}\n\n\
             [INSTRUCTIONS]\n\
             1. Answer in 1-3 sentences.\n\
             2. Cite evidence you actually used as [source: <CHUNK_ID>].\n\n\
             [END]\n"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_core::models::ChunkType;
    use scholar_core::traits::WhitespaceCounter;

    fn assembler() -> PromptAssembler {
        PromptAssembler::new(PromptConfig::default(), Arc::new(WhitespaceCounter))
    }

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            chunk_id: id.to_string(),
            chunk_type: ChunkType::Topic,
            title: String::new(),
            text: text.to_string(),
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn fact_lines_survive_truncation() {
        let filler = "lorem ipsum dolor sit amet ".repeat(60);
        let text = format!("{filler}\nTotal classes: 5\nlearned at: 2025-06-21\n{filler}");
        let out = truncate_head_tail_preserve_facts(&text, 200);
        assert!(out.contains("Total classes: 5"));
        assert!(out.contains("learned at: 2025-06-21"));
        assert!(out.contains("..."));
        assert!(out.chars().count() <= 220);
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_head_tail_preserve_facts("short", 100), "short");
    }

    #[test]
    fn strict_prompt_carries_headers_question_and_refusal() {
        let prompt = assembler().build_strict(
            &[chunk("TOPIC-11", "Databases use tables.")],
            "Describe each course",
            4,
            None,
        );
        assert!(prompt.contains("[CHUNK id=TOPIC-11 type=topic]"));
        assert!(prompt.contains("Describe each course"));
        assert!(prompt.contains(REFUSAL_ANSWER));
        assert!(prompt.contains("[calc: 2+3=5]"));
    }

    #[test]
    fn zero_fit_still_includes_top_chunk() {
        let config = PromptConfig {
            max_tokens: 610,
            reserved_answer: 400,
            overhead: 200,
            ..PromptConfig::default()
        };
        let assembler = PromptAssembler::new(config, Arc::new(WhitespaceCounter));
        let huge = "word ".repeat(5000);
        let prompt = assembler.build_strict(&[chunk("BIG-1", &huge)], "q", 4, None);
        assert!(prompt.contains("[CHUNK id=BIG-1"));
    }

    #[test]
    fn history_keeps_last_turns_and_tails() {
        let history: Vec<ConversationTurn> = (0..10)
            .map(|i| ConversationTurn {
                role: if i % 2 == 0 { "user" } else { "assistant" }.into(),
                content: format!("turn {i} {}", "x".repeat(900)),
            })
            .collect();
        let prompt = assembler().build_strict(&[], "q", 4, Some(&history));
        // Only the last 6 turns survive.
        assert!(!prompt.contains("turn 3 "));
        assert!(prompt.contains("[HISTORY]"));
        // Long turns keep their tails (the leading label is cut away).
        assert!(prompt.contains("xxxx"));
    }

    #[test]
    fn output_stays_within_answer_reserve() {
        let counter = WhitespaceCounter;
        let chunks: Vec<Chunk> = (0..10)
            .map(|i| chunk(&format!("C-{i}"), &"evidence token ".repeat(400)))
            .collect();
        let assembler = assembler();
        let prompt = assembler.build_strict(&chunks, "short question", 10, None);
        let budget = PromptConfig::default();
        assert!(
            counter.count_tokens(&prompt) <= budget.max_tokens - budget.reserved_answer,
            "prompt exceeded the answer reserve"
        );
    }
}
