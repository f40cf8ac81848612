use serde::{Deserialize, Serialize};

use super::env_or;

/// Prompt token budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Global token budget B.
    pub max_tokens: usize,
    /// Tokens reserved for the answer, R.
    pub reserved_answer: usize,
    /// Fixed template overhead, O. Evidence gets B − R − O.
    pub overhead: usize,
    /// Most recent turns included when history is present.
    pub history_max_turns: usize,
    /// Per-turn character cap; long turns keep their tail.
    pub history_turn_char_cap: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        PromptConfig {
            max_tokens: 4096,
            reserved_answer: 400,
            overhead: 200,
            history_max_turns: 6,
            history_turn_char_cap: 800,
        }
    }
}

impl PromptConfig {
    pub fn from_env() -> Self {
        let d = PromptConfig::default();
        PromptConfig {
            max_tokens: env_or("PROMPT_MAX_TOKENS", d.max_tokens),
            reserved_answer: env_or("PROMPT_RESERVED_ANSWER", d.reserved_answer),
            overhead: env_or("PROMPT_OVERHEAD", d.overhead),
            ..d
        }
    }

    /// Tokens available for evidence.
    pub fn evidence_budget(&self) -> usize {
        self.max_tokens
            .saturating_sub(self.reserved_answer)
            .saturating_sub(self.overhead)
    }
}
