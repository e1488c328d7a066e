//! Image discovery and loading for extraction batches.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::types::SimilarityResult;

/// Extensions accepted when scanning a photo directory.
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp"];

/// Name of the optional label map inside an image directory.
pub const LABELS_FILENAME: &str = "categories.json";

/// One item to feed through a feature extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSource {
    pub id: String,
    pub path: PathBuf,
    pub label: Option<String>,
}

impl ItemSource {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Load an image from a file path.
pub fn load_image(path: &Path) -> SimilarityResult<DynamicImage> {
    Ok(image::open(path)?)
}

/// Check if a path has one of the given extensions (case-insensitive).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    extensions.iter().any(|e| *e == ext)
}

/// List files in `dir` with a matching extension, sorted by path.
///
/// Not recursive.
pub fn discover_images(dir: &Path, extensions: &[&str]) -> SimilarityResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort();
    tracing::debug!("Found {} images in {}", files.len(), dir.display());
    Ok(files)
}

/// File stem as a string, e.g. `red_square` for `red_square.jpg`.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File name as a string, e.g. `red_square.jpg`.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read a `{ "stem": "label" }` map from `dir/categories.json`.
///
/// A missing file yields an empty map.
pub fn load_labels(dir: &Path) -> SimilarityResult<HashMap<String, String>> {
    let path = dir.join(LABELS_FILENAME);
    if !path.exists() {
        tracing::debug!("No label map at {}", path.display());
        return Ok(HashMap::new());
    }
    let bytes = std::fs::read(&path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
