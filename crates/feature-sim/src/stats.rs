//! Summary statistics over vectors and similarity matrices.

use serde::{Deserialize, Serialize};

use crate::matrix::SimilarityMatrix;
use crate::similarity::l2_norm;
use crate::types::{FeatureStore, SimilarityError, SimilarityResult};

/// Matrix mean above which a set is considered highly cohesive.
pub const HIGH_COHESION: f64 = 0.8;

/// Matrix mean above which a set is considered moderately cohesive.
pub const MODERATE_COHESION: f64 = 0.6;

/// Statistics over the components of a single vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub norm: f64,
}

impl VectorStats {
    /// Compute stats for one vector. An empty slice yields all zeros.
    pub fn of(values: &[f32]) -> Self {
        let summary = Summary::of(values.iter().map(|v| *v as f64));
        Self {
            mean: summary.mean,
            std: summary.std,
            min: summary.min,
            max: summary.max,
            norm: l2_norm(values),
        }
    }
}

/// Statistics over the off-diagonal upper triangle of a similarity matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatrixStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// Number of pairs summarized, N(N-1)/2.
    pub count: usize,
}

impl MatrixStats {
    /// Summarize every pair with `i < j`. Needs at least two items.
    pub fn of(matrix: &SimilarityMatrix) -> SimilarityResult<Self> {
        if matrix.len() < 2 {
            return Err(SimilarityError::InsufficientData {
                required: 2,
                actual: matrix.len(),
            });
        }

        let summary = Summary::of(matrix.upper_triangle().map(|(_, _, v)| v as f64));
        Ok(Self {
            mean: summary.mean,
            std: summary.std,
            min: summary.min,
            max: summary.max,
            count: summary.count,
        })
    }
}

/// Statistics over every component of every vector in a store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSetStats {
    pub rows: usize,
    pub dimension: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl FeatureSetStats {
    pub fn of(store: &FeatureStore) -> Self {
        let summary = Summary::of(
            store
                .iter()
                .flat_map(|v| v.values.iter().map(|x| *x as f64)),
        );
        Self {
            rows: store.len(),
            dimension: store.dimension().unwrap_or(0),
            mean: summary.mean,
            std: summary.std,
            min: summary.min,
            max: summary.max,
        }
    }
}

/// Coarse verdict on how alike a whole set is, from its mean pair similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cohesion {
    /// Likely the same scene from different angles or times.
    High,
    /// Likely the same category or theme.
    Moderate,
    /// Different scenes or themes.
    Low,
}

impl Cohesion {
    pub fn classify(mean_similarity: f64) -> Self {
        if mean_similarity > HIGH_COHESION {
            Cohesion::High
        } else if mean_similarity > MODERATE_COHESION {
            Cohesion::Moderate
        } else {
            Cohesion::Low
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Cohesion::High => {
                "items are highly similar, likely the same scene from different angles or times"
            }
            Cohesion::Moderate => "items share some similarity, likely the same category or theme",
            Cohesion::Low => "items differ substantially, likely different scenes or themes",
        }
    }
}

/// Single-pass mean, population std, min, and max.
struct Summary {
    count: usize,
    mean: f64,
    std: f64,
    min: f64,
    max: f64,
}

impl Summary {
    fn of(values: impl Iterator<Item = f64>) -> Self {
        // Welford's update keeps the variance stable for long vectors.
        let mut count = 0usize;
        let mut mean = 0.0f64;
        let mut m2 = 0.0f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for x in values {
            count += 1;
            let delta = x - mean;
            mean += delta / count as f64;
            m2 += delta * (x - mean);
            min = min.min(x);
            max = max.max(x);
        }

        if count == 0 {
            return Self {
                count,
                mean: 0.0,
                std: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }

        Self {
            count,
            mean,
            std: (m2 / count as f64).sqrt(),
            min,
            max,
        }
    }
}
