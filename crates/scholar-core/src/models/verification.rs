//! Structured result of answer verification.

use serde::{Deserialize, Serialize};

/// Outcome of verifying a generated answer against its evidence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationReport {
    pub ok: bool,
    pub is_refusal: bool,
    pub cited_chunk_ids: Vec<String>,
    pub errors: Vec<String>,
}

impl VerificationReport {
    pub fn passed() -> Self {
        VerificationReport {
            ok: true,
            ..Default::default()
        }
    }

    pub fn refusal() -> Self {
        VerificationReport {
            ok: true,
            is_refusal: true,
            ..Default::default()
        }
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.ok = false;
        self.errors.push(error.into());
    }
}
