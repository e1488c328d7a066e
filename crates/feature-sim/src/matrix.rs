//! All-pairs cosine similarity matrix.

use serde::{Deserialize, Serialize};

use crate::similarity::{cosine_from_parts, dot, l2_norm};
use crate::types::FeatureStore;

/// Symmetric N×N similarity matrix indexed by store position.
///
/// Stored row-major. Serializes as a list of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f32>>", into = "Vec<Vec<f32>>")]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute the cosine similarity of every pair in the store.
    ///
    /// A zero-norm vector has similarity 0.0 with everything, itself included.
    pub fn build(store: &FeatureStore) -> Self {
        let n = store.len();
        let vectors = store.as_slice();
        let norms: Vec<f64> = vectors.iter().map(|v| l2_norm(&v.values)).collect();

        let mut values = vec![0.0f32; n * n];
        for i in 0..n {
            values[i * n + i] = if norms[i] != 0.0 { 1.0 } else { 0.0 };
            for j in (i + 1)..n {
                let sim = cosine_from_parts(
                    dot(&vectors[i].values, &vectors[j].values),
                    norms[i],
                    norms[j],
                );
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }

        tracing::debug!("Built {n}x{n} similarity matrix");
        Self { size: n, values }
    }

    /// Number of rows (and columns).
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Similarity between store positions `i` and `j`.
    ///
    /// Panics if either index is out of range.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        assert!(i < self.size && j < self.size, "matrix index out of range");
        self.values[i * self.size + j]
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    /// Iterate the off-diagonal upper triangle as `(i, j, score)`, row-major.
    pub fn upper_triangle(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let n = self.size;
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j, self.values[i * n + j])))
    }

    /// Whether `m[i][j]` and `m[j][i]` agree within `tolerance` everywhere.
    pub fn is_symmetric(&self, tolerance: f32) -> bool {
        self.upper_triangle()
            .all(|(i, j, v)| (v - self.get(j, i)).abs() <= tolerance)
    }

    /// Copy out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        (0..self.size).map(|i| self.row(i).to_vec()).collect()
    }
}

impl TryFrom<Vec<Vec<f32>>> for SimilarityMatrix {
    type Error = String;

    fn try_from(rows: Vec<Vec<f32>>) -> Result<Self, Self::Error> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size * size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(format!(
                    "row {i} has {} columns, expected {size}",
                    row.len()
                ));
            }
            values.extend(row);
        }
        Ok(Self { size, values })
    }
}

impl From<SimilarityMatrix> for Vec<Vec<f32>> {
    fn from(matrix: SimilarityMatrix) -> Self {
        matrix.to_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_of(vectors: &[Vec<f32>]) -> FeatureStore {
        let mut store = FeatureStore::new();
        for (i, v) in vectors.iter().enumerate() {
            store.push(format!("v{i}"), v.clone()).unwrap();
        }
        store
    }

    #[test]
    fn test_symmetric_and_in_range() {
        let store = store_of(&[
            vec![0.3, -1.2, 4.0, 0.01],
            vec![2.5, 0.7, -0.4, 1.0],
            vec![-3.0, 3.0, 0.2, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![1e-3, 5.0, -2.0, 7.5],
        ]);
        let m = SimilarityMatrix::build(&store);

        assert_eq!(m.len(), 5);
        assert!(m.is_symmetric(1e-6));
        for i in 0..m.len() {
            for j in 0..m.len() {
                let v = m.get(i, j);
                assert!((-1.0..=1.0).contains(&v), "m[{i}][{j}] = {v}");
                assert_eq!(v, m.get(j, i));
            }
        }
    }

    #[test]
    fn test_diagonal_follows_norm() {
        let store = store_of(&[vec![3.0, 4.0], vec![0.0, 0.0], vec![-1.0, 0.5]]);
        let m = SimilarityMatrix::build(&store);
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(1, 1), 0.0);
        assert_eq!(m.get(2, 2), 1.0);
        assert_eq!(m.get(0, 1), 0.0);
        assert_eq!(m.get(1, 2), 0.0);
    }

    #[test]
    fn test_known_values() {
        let store = store_of(&[vec![1.0, 0.0, 0.0], vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
        let m = SimilarityMatrix::build(&store);
        assert_eq!(m.get(0, 1), 1.0);
        assert_eq!(m.get(0, 2), 0.0);

        let store = store_of(&[vec![1.0, 0.0], vec![-1.0, 0.0]]);
        let m = SimilarityMatrix::build(&store);
        assert_eq!(m.get(0, 1), -1.0);
    }

    #[test]
    fn test_small_stores() {
        let empty = SimilarityMatrix::build(&FeatureStore::new());
        assert!(empty.is_empty());
        assert_eq!(empty.upper_triangle().count(), 0);

        let single = SimilarityMatrix::build(&store_of(&[vec![2.0]]));
        assert_eq!(single.len(), 1);
        assert_eq!(single.get(0, 0), 1.0);
    }

    #[test]
    fn test_upper_triangle_row_major() {
        let store = store_of(&[vec![1.0], vec![1.0], vec![1.0]]);
        let m = SimilarityMatrix::build(&store);
        let pairs: Vec<(usize, usize)> = m.upper_triangle().map(|(i, j, _)| (i, j)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_serde_rows() {
        let store = store_of(&[vec![1.0, 0.0], vec![0.0, 1.0]]);
        let m = SimilarityMatrix::build(&store);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "[[1.0,0.0],[0.0,1.0]]");

        let back: SimilarityMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);

        let ragged: Result<SimilarityMatrix, _> = serde_json::from_str("[[1.0],[0.0,1.0]]");
        assert!(ragged.is_err());
    }
}
