//! End-to-end analysis of a feature store.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::cluster::cluster;
use crate::extreme::find_min;
use crate::matrix::SimilarityMatrix;
use crate::similarity::rank_neighbors;
use crate::stats::{Cohesion, FeatureSetStats, MatrixStats, VectorStats};
use crate::types::{
    AnalysisReport, FeatureStore, ItemSummary, Neighbor, SimilarityError, SimilarityResult,
};

/// Default grouping threshold.
pub const DEFAULT_THRESHOLD: f32 = 0.8;

/// Minimum number of items a similarity analysis needs.
pub const MIN_ITEMS: usize = 2;

/// Knobs for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    /// Similarity an item must exceed to join an anchor's group.
    pub threshold: f32,
    /// Keep only this many neighbors per item. `None` keeps the full ranking.
    pub top_k: Option<usize>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top_k: None,
        }
    }
}

impl AnalysisOptions {
    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }
}

/// Run the full analysis and assemble a report.
///
/// Fails up front with [`SimilarityError::InsufficientData`] when the store
/// has fewer than two items; no partial report is produced.
pub fn analyze(store: &FeatureStore, options: &AnalysisOptions) -> SimilarityResult<AnalysisReport> {
    if store.len() < MIN_ITEMS {
        return Err(SimilarityError::InsufficientData {
            required: MIN_ITEMS,
            actual: store.len(),
        });
    }
    if !options.threshold.is_finite() {
        return Err(SimilarityError::InvalidThreshold(options.threshold));
    }

    let started = Instant::now();
    let ids = store.ids();
    let matrix = SimilarityMatrix::build(store);

    let mut per_item_nearest = BTreeMap::new();
    for (i, id) in ids.iter().enumerate() {
        let neighbors = rank_neighbors(&matrix, i, options.top_k)?
            .into_iter()
            .map(|(j, score)| Neighbor {
                id: ids[j].clone(),
                index: j,
                score,
            })
            .collect::<Vec<_>>();
        per_item_nearest.insert(id.clone(), neighbors);
    }

    let clusters = cluster(&matrix, &ids, options.threshold)?;
    let most_dissimilar_pair = find_min(&matrix, &ids)?;
    let aggregate_stats = MatrixStats::of(&matrix)?;
    let feature_stats = FeatureSetStats::of(store);
    let cohesion = Cohesion::classify(aggregate_stats.mean);

    let items = store
        .iter()
        .map(|v| ItemSummary {
            id: v.id.clone(),
            label: v.label.clone(),
            stats: VectorStats::of(&v.values),
        })
        .collect();

    tracing::info!(
        "Analyzed {} items (dim {}): mean similarity {:.4}, {} clusters, in {:?}",
        ids.len(),
        feature_stats.dimension,
        aggregate_stats.mean,
        clusters.len(),
        started.elapsed()
    );

    Ok(AnalysisReport {
        num_items: ids.len(),
        dimension: feature_stats.dimension,
        threshold: options.threshold,
        item_ids: ids,
        items,
        similarity_matrix: matrix,
        per_item_nearest,
        clusters,
        most_dissimilar_pair,
        aggregate_stats,
        feature_stats,
        cohesion,
    })
}
