//! Front ends, one per data source, sharing one extraction and analysis pipeline.

pub mod images;
pub mod photos;

use std::collections::BTreeMap;
use std::time::Duration;

use feature_sim::{
    analyze, extract_all, AnalysisOptions, AnalysisReport, ExtractionFailure, FeatureExtractor,
    FeatureStore, ItemSource,
};

/// Which data source a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Generated test images with a label map.
    Images,
    /// Real photos.
    Photos,
    /// A previously saved feature archive.
    Archive,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Images => "images",
            SourceKind::Photos => "photos",
            SourceKind::Archive => "archive",
        }
    }

    /// Results file name written for this source.
    pub fn results_filename(&self) -> &'static str {
        match self {
            SourceKind::Images => "results.json",
            SourceKind::Photos => "photo_results.json",
            SourceKind::Archive => "archive_results.json",
        }
    }

    /// Feature archive file name written for this source.
    pub fn features_filename(&self) -> &'static str {
        match self {
            SourceKind::Images => "features.fsa",
            SourceKind::Photos => "photo_features.fsa",
            SourceKind::Archive => "archive_features.fsa",
        }
    }
}

/// Everything one front-end run produced.
#[derive(Debug)]
pub struct Run {
    pub kind: SourceKind,
    pub source: String,
    pub store: FeatureStore,
    pub report: AnalysisReport,
    pub failures: Vec<ExtractionFailure>,
    pub image_sizes: BTreeMap<String, (u32, u32)>,
    pub extraction_time: Duration,
}

/// Extract features for `sources` and analyze the successes.
pub fn run_pipeline(
    kind: SourceKind,
    source: String,
    sources: &[ItemSource],
    extractor: &mut dyn FeatureExtractor,
    options: &AnalysisOptions,
) -> anyhow::Result<Run> {
    if sources.is_empty() {
        anyhow::bail!("no input images found in {source}");
    }

    tracing::info!("Processing {} {} from {source}", sources.len(), kind.as_str());
    let outcome = extract_all(extractor, sources)?;
    let report = analyze(&outcome.store, options)?;

    Ok(Run {
        kind,
        source,
        store: outcome.store,
        report,
        failures: outcome.failures,
        image_sizes: outcome.image_sizes,
        extraction_time: outcome.elapsed,
    })
}

/// Analyze a store that was loaded rather than extracted.
pub fn run_store(
    source: String,
    store: FeatureStore,
    options: &AnalysisOptions,
) -> anyhow::Result<Run> {
    let report = analyze(&store, options)?;
    Ok(Run {
        kind: SourceKind::Archive,
        source,
        store,
        report,
        failures: Vec::new(),
        image_sizes: BTreeMap::new(),
        extraction_time: Duration::ZERO,
    })
}
