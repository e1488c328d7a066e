//! Configuration loading and resolution.

use std::path::PathBuf;

/// Environment variable naming the ONNX model.
pub const MODEL_ENV: &str = "FEATURE_SIM_MODEL";

/// Environment variable naming the output directory.
pub const OUTPUT_ENV: &str = "FEATURE_SIM_OUTPUT";

/// Default model filename (DINOv2 ViT-S/14 exported to ONNX).
pub const MODEL_FILENAME: &str = "dinov2_vits14.onnx";

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Default directory of generated test images.
pub const DEFAULT_IMAGES_DIR: &str = "data/test_images";

/// Default directory of real photos.
pub const DEFAULT_PHOTOS_DIR: &str = "data/test_photo";

/// Resolve the model path: flag, then env var, then `./models/`, then `~/.feature-sim/models/`.
pub fn resolve_model_path(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    if let Ok(env_path) = std::env::var(MODEL_ENV) {
        return PathBuf::from(env_path);
    }

    let cwd_model = PathBuf::from("models").join(MODEL_FILENAME);
    if cwd_model.exists() {
        return cwd_model;
    }

    resolve_default_model_path()
}

fn resolve_default_model_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    PathBuf::from(home)
        .join(".feature-sim")
        .join("models")
        .join(MODEL_FILENAME)
}

/// Resolve the output directory: flag, then env var, then `./output`.
pub fn resolve_output_dir(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    std::env::var(OUTPUT_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR))
}
