//! Cosine similarity and nearest-neighbor ranking.

use std::cmp::Ordering;

use crate::matrix::SimilarityMatrix;
use crate::types::{SimilarityError, SimilarityResult};

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 when either vector has zero norm, when the lengths differ,
/// or when the inputs are empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    cosine_from_parts(dot(a, b), l2_norm(a), l2_norm(b))
}

/// L2 norm, accumulated in f64.
pub fn l2_norm(values: &[f32]) -> f64 {
    values
        .iter()
        .map(|v| {
            let v = *v as f64;
            v * v
        })
        .sum::<f64>()
        .sqrt()
}

/// Dot product, accumulated in f64.
pub(crate) fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| *x as f64 * *y as f64)
        .sum()
}

/// Combine a dot product and two norms into a similarity in [-1, 1].
pub(crate) fn cosine_from_parts(dot: f64, norm_a: f64, norm_b: f64) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32
}

/// Rank every other item by similarity to the item at `index`.
///
/// Scores are descending; equal scores keep ascending store order so the
/// output is reproducible. `top_k` truncates the list, `None` keeps all of it.
pub fn rank_neighbors(
    matrix: &SimilarityMatrix,
    index: usize,
    top_k: Option<usize>,
) -> SimilarityResult<Vec<(usize, f32)>> {
    let len = matrix.len();
    if index >= len {
        return Err(SimilarityError::IndexOutOfRange { index, len });
    }

    let mut ranked: Vec<(usize, f32)> = matrix
        .row(index)
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != index)
        .map(|(j, score)| (j, *score))
        .collect();

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    if let Some(k) = top_k {
        ranked.truncate(k);
    }
    Ok(ranked)
}
