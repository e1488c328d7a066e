//! Front end for the generated test-image set.
//!
//! Expects `*.jpg` files plus an optional `categories.json` mapping file
//! stems to human-readable categories.

use std::path::Path;

use feature_sim::source::{discover_images, file_stem, load_labels};
use feature_sim::{AnalysisOptions, FeatureExtractor, ItemSource};

use super::{run_pipeline, Run, SourceKind};

/// Grouping threshold used for the test-image set.
pub const DEFAULT_THRESHOLD: f32 = 0.8;

const EXTENSIONS: &[&str] = &["jpg"];

/// List the test images in `dir`, keyed by file stem and labeled by category.
pub fn collect_sources(dir: &Path) -> anyhow::Result<Vec<ItemSource>> {
    let labels = load_labels(dir)?;
    let sources = discover_images(dir, EXTENSIONS)?
        .into_iter()
        .map(|path| {
            let stem = file_stem(&path);
            let label = labels.get(&stem).cloned().unwrap_or_else(|| stem.clone());
            ItemSource::new(stem, path).with_label(label)
        })
        .collect();
    Ok(sources)
}

pub fn run(
    dir: &Path,
    extractor: &mut dyn FeatureExtractor,
    options: &AnalysisOptions,
) -> anyhow::Result<Run> {
    if !dir.is_dir() {
        anyhow::bail!("test image directory does not exist: {}", dir.display());
    }
    let sources = collect_sources(dir)?;
    run_pipeline(
        SourceKind::Images,
        dir.display().to_string(),
        &sources,
        extractor,
        options,
    )
}
