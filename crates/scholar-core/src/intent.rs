//! Query intent labels.

use serde::{Deserialize, Serialize};

/// The router's four-way intent split. Serialized uppercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intent {
    /// Social opener; answered with a canned reply, no retrieval.
    Greeting,
    /// Enumeration/count/lookup query answerable from the relational store.
    Factual,
    /// Explanation/summary query answered by the RAG pipeline.
    Semantic,
    /// Both factual and semantic cues present; RAG with relational injection.
    Mixed,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "GREETING",
            Intent::Factual => "FACTUAL",
            Intent::Semantic => "SEMANTIC",
            Intent::Mixed => "MIXED",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
