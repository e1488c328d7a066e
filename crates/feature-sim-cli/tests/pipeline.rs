//! Front-end pipeline tests driven by a model-free extractor.

use std::path::Path;

use feature_sim::{
    AnalysisOptions, ArchiveReader, FeatureExtractor, SimilarityResult,
};
use feature_sim_cli::frontend::{images, photos, run_store, SourceKind};
use feature_sim_cli::output::{save_run, ResultsFile};
use feature_sim_cli::render::RunView;
use image::DynamicImage;

// ─────────────────────── helpers ───────────────────────

/// Mean RGB of the image as a 3-d feature vector.
struct MeanColor;

impl FeatureExtractor for MeanColor {
    fn extract(&mut self, image: &DynamicImage) -> SimilarityResult<Vec<f32>> {
        let rgb = image.to_rgb8();
        let n = (rgb.width() * rgb.height()) as f32;
        let mut sums = [0.0f32; 3];
        for pixel in rgb.pixels() {
            for (sum, channel) in sums.iter_mut().zip(pixel.0.iter()) {
                *sum += *channel as f32;
            }
        }
        Ok(sums.iter().map(|s| s / n).collect())
    }
}

fn write_solid(dir: &Path, name: &str, color: [u8; 3]) {
    let img = image::RgbImage::from_pixel(32, 24, image::Rgb(color));
    img.save(dir.join(name)).unwrap();
}

fn image_fixture(dir: &Path) {
    write_solid(dir, "red_square.jpg", [255, 0, 0]);
    write_solid(dir, "dark_red_circle.jpg", [180, 0, 0]);
    write_solid(dir, "green_circle.jpg", [0, 255, 0]);
    write_solid(dir, "blue_triangle.jpg", [0, 0, 255]);
    write_solid(dir, "ignored.png", [255, 255, 255]);
    std::fs::write(
        dir.join("categories.json"),
        r#"{"red_square": "red square", "green_circle": "green circle"}"#,
    )
    .unwrap();
}

// ═══════════════════════════════════════════════════════
// IMAGES FRONT END
// ═══════════════════════════════════════════════════════

#[test]
fn images_collects_jpgs_with_labels() {
    let dir = tempfile::tempdir().unwrap();
    image_fixture(dir.path());

    let sources = images::collect_sources(dir.path()).unwrap();
    let ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["blue_triangle", "dark_red_circle", "green_circle", "red_square"]
    );
    assert_eq!(sources[3].label.as_deref(), Some("red square"));
    // Stems without a category fall back to the stem itself.
    assert_eq!(sources[0].label.as_deref(), Some("blue_triangle"));
}

#[test]
fn images_run_groups_reds() {
    let dir = tempfile::tempdir().unwrap();
    image_fixture(dir.path());

    let run = images::run(
        dir.path(),
        &mut MeanColor,
        &AnalysisOptions::with_threshold(images::DEFAULT_THRESHOLD),
    )
    .unwrap();

    assert_eq!(run.kind, SourceKind::Images);
    assert_eq!(run.report.num_items, 4);
    assert!(run.failures.is_empty());
    assert_eq!(run.report.clusters.len(), 1);
    assert_eq!(
        run.report.clusters[0].members,
        vec!["dark_red_circle", "red_square"]
    );
    assert_eq!(run.report.nearest("red_square").unwrap().id, "dark_red_circle");

    let text = RunView(&run).to_string();
    assert!(text.contains("Similarity matrix"));
    assert!(text.contains("Group 1:"));
    assert!(text.contains("red_square (red square)"));
    assert!(text.contains("Conclusion:"));
    assert!(!text.contains("Per-item features"));
}

#[test]
fn images_missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = images::run(&missing, &mut MeanColor, &AnalysisOptions::default()).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

// ═══════════════════════════════════════════════════════
// PHOTOS FRONT END
// ═══════════════════════════════════════════════════════

#[test]
fn photos_skip_unreadable_files() {
    let dir = tempfile::tempdir().unwrap();
    write_solid(dir.path(), "city_building.png", [90, 90, 100]);
    write_solid(dir.path(), "wildlife_bird.png", [20, 140, 30]);
    write_solid(dir.path(), "portrait.bmp", [200, 160, 140]);
    std::fs::write(dir.path().join("broken.jpg"), b"not an image").unwrap();

    let run = photos::run(
        dir.path(),
        &mut MeanColor,
        &AnalysisOptions::with_threshold(photos::DEFAULT_THRESHOLD),
    )
    .unwrap();

    assert_eq!(run.report.num_items, 3);
    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].id, "broken.jpg");
    assert_eq!(run.image_sizes.get("portrait.bmp"), Some(&(32, 24)));

    let city = run
        .report
        .items
        .iter()
        .find(|i| i.id == "city_building.png")
        .unwrap();
    assert_eq!(city.label.as_deref(), Some("city/building"));

    let text = RunView(&run).to_string();
    assert!(text.contains("Per-item features"));
    assert!(text.contains("Image size:  32 x 24"));
    assert!(text.contains("Items skipped:      1"));
}

#[test]
fn photos_need_two_readable_items() {
    let dir = tempfile::tempdir().unwrap();
    write_solid(dir.path(), "only.png", [1, 2, 3]);
    std::fs::write(dir.path().join("broken.webp"), b"junk").unwrap();

    let err = photos::run(dir.path(), &mut MeanColor, &AnalysisOptions::default()).unwrap_err();
    assert!(err.to_string().contains("Insufficient data"));
}

#[test]
fn photos_empty_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = photos::run(dir.path(), &mut MeanColor, &AnalysisOptions::default()).unwrap_err();
    assert!(err.to_string().contains("no input images"));
}

// ═══════════════════════════════════════════════════════
// OUTPUT AND ARCHIVE REPLAY
// ═══════════════════════════════════════════════════════

#[test]
fn saved_archive_replays_to_same_matrix() {
    let input = tempfile::tempdir().unwrap();
    image_fixture(input.path());
    let out = tempfile::tempdir().unwrap();

    let run = images::run(input.path(), &mut MeanColor, &AnalysisOptions::default()).unwrap();
    let saved = save_run(&run, out.path(), true).unwrap();

    assert!(saved.results.ends_with("results.json"));
    let features = saved.features.expect("features written");
    assert!(features.ends_with("features.fsa"));

    let bytes = std::fs::read(&saved.results).unwrap();
    let results: ResultsFile = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(results.source_kind, "images");
    assert_eq!(results.report.item_ids, run.report.item_ids);

    let store = ArchiveReader::read_from_file(&features).unwrap();
    let replay = run_store(
        features.display().to_string(),
        store,
        &AnalysisOptions::default(),
    )
    .unwrap();
    assert_eq!(replay.kind, SourceKind::Archive);
    assert_eq!(replay.report.similarity_matrix, run.report.similarity_matrix);
    assert_eq!(replay.report.clusters, run.report.clusters);
}

#[test]
fn results_only_when_features_not_requested() {
    let input = tempfile::tempdir().unwrap();
    image_fixture(input.path());
    let out = tempfile::tempdir().unwrap();

    let run = images::run(input.path(), &mut MeanColor, &AnalysisOptions::default()).unwrap();
    let saved = save_run(&run, &out.path().join("nested"), false).unwrap();
    assert!(saved.results.exists());
    assert!(saved.features.is_none());
}
