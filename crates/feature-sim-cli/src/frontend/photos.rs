//! Front end for a directory of real photos.

use std::path::Path;

use feature_sim::source::{discover_images, file_name};
use feature_sim::{AnalysisOptions, FeatureExtractor, ItemSource, PHOTO_EXTENSIONS};

use super::{run_pipeline, Run, SourceKind};

/// Grouping threshold used for photos.
pub const DEFAULT_THRESHOLD: f32 = 0.85;

const HINTS: &[(&[&str], &str)] = &[
    (&["attraction", "landmark", "world", "travel"], "landmark/travel"),
    (&["nature", "animal", "bird", "wildlife"], "nature/animal"),
    (&["people", "person", "portrait"], "people/portrait"),
    (&["city", "urban", "building"], "city/building"),
];

/// Guess likely categories from keywords in a file name.
///
/// The extractor produces features, not classes, so this is only a hint.
pub fn category_hints(filename: &str) -> Vec<&'static str> {
    let lower = filename.to_lowercase();
    let hints: Vec<&'static str> = HINTS
        .iter()
        .filter(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, hint)| *hint)
        .collect();

    if hints.is_empty() {
        vec!["unknown"]
    } else {
        hints
    }
}

/// List the photos in `dir`, keyed by file name and labeled by category hint.
pub fn collect_sources(dir: &Path) -> anyhow::Result<Vec<ItemSource>> {
    let sources = discover_images(dir, PHOTO_EXTENSIONS)?
        .into_iter()
        .map(|path| {
            let name = file_name(&path);
            let label = category_hints(&name).join(", ");
            ItemSource::new(name, path).with_label(label)
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
        anyhow::bail!("photo directory does not exist: {}", dir.display());
    }
    let sources = collect_sources(dir)?;
    run_pipeline(
        SourceKind::Photos,
        dir.display().to_string(),
        &sources,
        extractor,
        options,
    )
}
