/// L2 norm of `v`.
pub(crate) fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// In-place L2 normalization helper to keep allocations down during hot paths.
/// Uses f32 throughout for better SIMD auto-vectorization.
pub(crate) fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

/// Average token-level rows into a single sentence vector.
/// Returns `None` when the rows are empty or ragged.
pub(crate) fn mean_pool(rows: &[Vec<f32>]) -> Option<Vec<f32>> {
    let width = rows.first()?.len();
    if rows.iter().any(|row| row.len() != width) {
        return None;
    }
    let mut pooled = vec![0f32; width];
    for row in rows {
        for (acc, x) in pooled.iter_mut().zip(row) {
            *acc += x;
        }
    }
    let count = rows.len() as f32;
    for x in pooled.iter_mut() {
        *x /= count;
    }
    Some(pooled)
}
