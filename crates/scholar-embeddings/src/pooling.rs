//! Tensor post-processing shared by both encoders.

/// L2-normalize in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v {
            *x /= norm;
        }
    }
}

/// Mean-pool one sample of a `[seq, dims]` slice over its first `valid`
/// positions (the non-padded tokens).
pub fn mean_pool(data: &[f32], seq_len: usize, dims: usize, valid: usize) -> Vec<f32> {
    let count = valid.min(seq_len).max(1);
    let mut pooled = vec![0.0f32; dims];
    for s in 0..count {
        for d in 0..dims {
            pooled[d] += data[s * dims + d];
        }
    }
    for v in &mut pooled {
        *v /= count as f32;
    }
    pooled
}

/// Pad a tokenized batch to its longest sequence.
/// Returns `(flat_ids, flat_mask, max_len)` row-major over the batch.
pub fn pad_batch(tokenized: &[(Vec<i64>, Vec<i64>)]) -> (Vec<i64>, Vec<i64>, usize) {
    let max_len = tokenized.iter().map(|(ids, _)| ids.len()).max().unwrap_or(1);
    let mut flat_ids = Vec::with_capacity(tokenized.len() * max_len);
    let mut flat_mask = Vec::with_capacity(tokenized.len() * max_len);
    for (ids, mask) in tokenized {
        flat_ids.extend_from_slice(ids);
        flat_mask.extend_from_slice(mask);
        for _ in ids.len()..max_len {
            flat_ids.push(0);
            flat_mask.push(0);
        }
    }
    (flat_ids, flat_mask, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_produces_unit_length() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn normalize_leaves_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn mean_pool_ignores_padding() {
        // seq=3, dims=2, last position is padding
        let data = vec![1.0, 2.0, 3.0, 4.0, 99.0, 99.0];
        let pooled = mean_pool(&data, 3, 2, 2);
        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[test]
    fn pad_batch_aligns_rows() {
        let batch = vec![
            (vec![101, 7, 102], vec![1, 1, 1]),
            (vec![101, 102], vec![1, 1]),
        ];
        let (ids, mask, max_len) = pad_batch(&batch);
        assert_eq!(max_len, 3);
        assert_eq!(ids, vec![101, 7, 102, 101, 102, 0]);
        assert_eq!(mask, vec![1, 1, 1, 1, 1, 0]);
    }
}
