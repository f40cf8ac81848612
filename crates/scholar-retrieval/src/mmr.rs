//! Maximal Marginal Relevance diversification.
//!
//! Greedy: seed with the candidate closest to the query, then repeatedly
//! add the candidate maximizing
//! `λ·sim(c, q) − (1−λ)·max_{s∈selected} sim(c, s)`.
//! Ties break toward first occurrence, so the pass is stable. Candidates
//! with missing vectors behave as zero similarity to everything.
//! O(n·k·D), with n capped by the upstream top-K.

use scholar_core::models::Candidate;

fn cosine(a: Option<&[f32]>, b: Option<&[f32]>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    if a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        dot += (*x as f64) * (*y as f64);
        na += (*x as f64) * (*x as f64);
        nb += (*y as f64) * (*y as f64);
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

/// Select up to `k` candidates balancing query relevance against
/// redundancy with already-selected ones. `0 ≤ lambda ≤ 1`; 1 is pure
/// relevance, 0 pure diversity.
pub fn rerank(candidates: &[Candidate], query_vec: &[f32], k: usize, lambda: f64) -> Vec<Candidate> {
    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }
    let n = candidates.len();
    let sim_query: Vec<f64> = candidates
        .iter()
        .map(|c| cosine(Some(query_vec), c.vector.as_deref()))
        .collect();

    let mut selected = vec![false; n];
    let mut result: Vec<usize> = Vec::with_capacity(k.min(n));

    // Seed: highest query similarity, first occurrence on ties.
    let mut first = 0;
    for i in 1..n {
        if sim_query[i] > sim_query[first] {
            first = i;
        }
    }
    selected[first] = true;
    result.push(first);

    while result.len() < k.min(n) {
        let mut best_score = f64::NEG_INFINITY;
        let mut best_idx = None;
        for i in 0..n {
            if selected[i] {
                continue;
            }
            let max_sim_selected = result
                .iter()
                .map(|&s| cosine(candidates[i].vector.as_deref(), candidates[s].vector.as_deref()))
                .fold(f64::NEG_INFINITY, f64::max)
                .max(0.0);
            let score = lambda * sim_query[i] - (1.0 - lambda) * max_sim_selected;
            if score > best_score {
                best_score = score;
                best_idx = Some(i);
            }
        }
        let Some(idx) = best_idx else { break };
        selected[idx] = true;
        result.push(idx);
    }

    result.into_iter().map(|i| candidates[i].clone()).collect()
}
