//! Merge dense and lexical candidates, dedupe by chunk id, hydrate
//! vectors/payloads for anything the dense pass did not return.

use std::collections::HashMap;

use tracing::debug;

use scholar_core::errors::ScholarResult;
use scholar_core::models::Candidate;
use scholar_core::traits::VectorSearcher;

/// Union of dense and lexical results in insertion order (dense first),
/// deduped by chunk id. Lexical-only ids enter as shells and are hydrated
/// from the vector store by chunk id.
pub fn merge_and_dedupe(
    dense: Vec<Candidate>,
    lex_ids: &[String],
    hydrator: &dyn VectorSearcher,
) -> ScholarResult<Vec<Candidate>> {
    let mut order: Vec<Candidate> = Vec::with_capacity(dense.len() + lex_ids.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for candidate in dense {
        let key = candidate.chunk_id().to_string();
        if !seen.contains_key(&key) {
            seen.insert(key, order.len());
            order.push(candidate);
        }
    }
    for id in lex_ids {
        if !seen.contains_key(id) {
            seen.insert(id.clone(), order.len());
            order.push(Candidate::shell(id));
        }
    }

    let missing: Vec<String> = order
        .iter()
        .filter(|c| c.vector.is_none())
        .map(|c| c.chunk_id().to_string())
        .collect();
    if !missing.is_empty() {
        let fetched = hydrator.points_by_chunk_ids(&missing)?;
        let mut hydrated = 0usize;
        for candidate in order.iter_mut().filter(|c| c.vector.is_none()) {
            if let Some(point) = fetched.get(candidate.chunk_id()) {
                candidate.vector = point.vector.clone();
                if candidate.payload.is_none() {
                    candidate.payload = point.payload.clone();
                }
                hydrated += 1;
            }
        }
        debug!(missing = missing.len(), hydrated, "hydrated merged candidates");
    }

    Ok(order)
}
