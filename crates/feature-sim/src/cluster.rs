//! Greedy threshold grouping over a similarity matrix.
//!
//! Each unassigned item, taken in store order, becomes an anchor and pulls in
//! every later unassigned item whose similarity *to the anchor* exceeds the
//! threshold. Members are never compared with each other, so a group is not
//! necessarily a clique and the partition depends on store order. Groups with
//! a single member are not reported.

use crate::matrix::SimilarityMatrix;
use crate::types::{Cluster, SimilarityError, SimilarityResult};

/// Partition items into similarity groups.
///
/// `ids` must be in store order and match the matrix size. The comparison is
/// strict: a pair scoring exactly `threshold` is not grouped.
pub fn cluster(
    matrix: &SimilarityMatrix,
    ids: &[String],
    threshold: f32,
) -> SimilarityResult<Vec<Cluster>> {
    if ids.len() != matrix.len() {
        return Err(SimilarityError::ShapeMismatch {
            matrix: matrix.len(),
            ids: ids.len(),
        });
    }
    if !threshold.is_finite() {
        return Err(SimilarityError::InvalidThreshold(threshold));
    }

    let n = matrix.len();
    let mut assigned = vec![false; n];
    let mut clusters = Vec::new();

    for i in 0..n {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let mut group = vec![i];

        for j in (i + 1)..n {
            if !assigned[j] && matrix.get(i, j) > threshold {
                group.push(j);
                assigned[j] = true;
            }
        }

        if group.len() > 1 {
            clusters.push(Cluster {
                members: group.into_iter().map(|k| ids[k].clone()).collect(),
            });
        }
    }

    tracing::debug!(
        "Grouped {n} items into {} clusters at threshold {threshold}",
        clusters.len()
    );
    Ok(clusters)
}
