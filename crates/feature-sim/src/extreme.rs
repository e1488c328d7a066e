//! Search for the least similar pair.

use crate::matrix::SimilarityMatrix;
use crate::types::{ExtremePair, SimilarityError, SimilarityResult};

/// Find the pair with the lowest off-diagonal similarity.
///
/// Pairs are visited row-major over `i < j`; on ties the first pair seen wins.
pub fn find_min(matrix: &SimilarityMatrix, ids: &[String]) -> SimilarityResult<ExtremePair> {
    if ids.len() != matrix.len() {
        return Err(SimilarityError::ShapeMismatch {
            matrix: matrix.len(),
            ids: ids.len(),
        });
    }

    let mut best: Option<(usize, usize, f32)> = None;
    for (i, j, score) in matrix.upper_triangle() {
        match best {
            Some((_, _, min)) if score >= min => {}
            _ => best = Some((i, j, score)),
        }
    }

    let (i, j, score) = best.ok_or(SimilarityError::InsufficientData {
        required: 2,
        actual: matrix.len(),
    })?;

    Ok(ExtremePair {
        first: ids[i].clone(),
        second: ids[j].clone(),
        score,
    })
}
