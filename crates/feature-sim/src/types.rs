//! Core data types for feature vectors, stores, and analysis output.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::matrix::SimilarityMatrix;
use crate::stats::{Cohesion, FeatureSetStats, MatrixStats, VectorStats};

/// A single embedding keyed by item identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FeatureVector {
    /// Create an unlabeled feature vector.
    pub fn new(id: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            values,
            label: None,
        }
    }

    /// Attach a label. Labels are metadata and never enter the computation.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Number of components.
    pub fn dimension(&self) -> usize {
        self.values.len()
    }
}

/// Ordered collection of feature vectors for one analysis run.
///
/// Insertion order is the canonical index order used by every matrix and
/// list derived from the store. All members share one dimension, which is
/// fixed by the first insertion unless set up front with
/// [`FeatureStore::with_dimension`].
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    vectors: Vec<FeatureVector>,
    dimension: Option<usize>,
    ids: HashSet<String>,
}

impl FeatureStore {
    /// Create an empty store whose dimension is set by the first insert.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with a fixed dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            ..Self::default()
        }
    }

    /// Insert a vector, enforcing dimension, id uniqueness, and finiteness.
    pub fn insert(&mut self, vector: FeatureVector) -> SimilarityResult<()> {
        if vector.values.is_empty() {
            return Err(SimilarityError::EmptyVector(vector.id));
        }

        if let Some(expected) = self.dimension {
            if vector.values.len() != expected {
                return Err(SimilarityError::DimensionMismatch {
                    id: vector.id,
                    expected,
                    actual: vector.values.len(),
                });
            }
        }

        if self.ids.contains(&vector.id) {
            return Err(SimilarityError::DuplicateId(vector.id));
        }

        if let Some(position) = vector.values.iter().position(|v| !v.is_finite()) {
            return Err(SimilarityError::NonFiniteValue {
                id: vector.id,
                position,
            });
        }

        self.dimension = Some(vector.values.len());
        self.ids.insert(vector.id.clone());
        self.vectors.push(vector);
        Ok(())
    }

    /// Convenience wrapper around [`FeatureStore::insert`] for unlabeled vectors.
    pub fn push(&mut self, id: impl Into<String>, values: Vec<f32>) -> SimilarityResult<()> {
        self.insert(FeatureVector::new(id, values))
    }

    /// Build a store from an iterator of vectors, failing on the first bad one.
    pub fn from_vectors<I>(vectors: I) -> SimilarityResult<Self>
    where
        I: IntoIterator<Item = FeatureVector>,
    {
        let mut store = Self::new();
        for vector in vectors {
            store.insert(vector)?;
        }
        Ok(store)
    }

    /// Shared dimension, if anything has been inserted or it was fixed up front.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vector at a store position.
    pub fn get(&self, index: usize) -> Option<&FeatureVector> {
        self.vectors.get(index)
    }

    /// Store position of an id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.vectors.iter().position(|v| v.id == id)
    }

    /// Item ids in store order.
    pub fn ids(&self) -> Vec<String> {
        self.vectors.iter().map(|v| v.id.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureVector> {
        self.vectors.iter()
    }

    pub fn as_slice(&self) -> &[FeatureVector] {
        &self.vectors
    }
}

impl<'a> IntoIterator for &'a FeatureStore {
    type Item = &'a FeatureVector;
    type IntoIter = std::slice::Iter<'a, FeatureVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.vectors.iter()
    }
}

/// One entry of a ranked neighbor list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: String,
    pub index: usize,
    pub score: f32,
}

/// A similarity group. The anchor comes first, then the members it pulled
/// in, in ascending store order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cluster {
    pub members: Vec<String>,
}

impl Cluster {
    /// The item that opened this group, if it has any members.
    pub fn anchor(&self) -> Option<&str> {
        self.members.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m == id)
    }
}

/// The least similar pair in a set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremePair {
    pub first: String,
    pub second: String,
    pub score: f32,
}

/// Per-item summary carried in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub stats: VectorStats,
}

/// Terminal aggregate of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub num_items: usize,
    pub dimension: usize,
    pub threshold: f32,
    pub item_ids: Vec<String>,
    pub items: Vec<ItemSummary>,
    pub similarity_matrix: SimilarityMatrix,
    pub per_item_nearest: BTreeMap<String, Vec<Neighbor>>,
    pub clusters: Vec<Cluster>,
    pub most_dissimilar_pair: ExtremePair,
    pub aggregate_stats: MatrixStats,
    pub feature_stats: FeatureSetStats,
    pub cohesion: Cohesion,
}

impl AnalysisReport {
    /// Best match for an item, if it has any neighbors.
    pub fn nearest(&self, id: &str) -> Option<&Neighbor> {
        self.per_item_nearest.get(id).and_then(|list| list.first())
    }

    /// Similarity between two items by id.
    pub fn similarity(&self, a: &str, b: &str) -> Option<f32> {
        let i = self.item_ids.iter().position(|id| id == a)?;
        let j = self.item_ids.iter().position(|id| id == b)?;
        Some(self.similarity_matrix.get(i, j))
    }
}

/// Errors that can occur in the similarity library.
#[derive(thiserror::Error, Debug)]
pub enum SimilarityError {
    #[error("Dimension mismatch for {id}: expected {expected}, got {actual}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("Empty feature vector: {0}")]
    EmptyVector(String),

    #[error("Duplicate item id: {0}")]
    DuplicateId(String),

    #[error("Non-finite value in {id} at position {position}")]
    NonFiniteValue { id: String, position: usize },

    #[error("Insufficient data: need at least {required} items, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Shape mismatch: matrix has {matrix} rows but {ids} ids were given")]
    ShapeMismatch { matrix: usize, ids: usize },

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(f32),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Archive error: {0}")]
    Archive(String),
}

/// Convenience result type.
pub type SimilarityResult<T> = Result<T, SimilarityError>;
