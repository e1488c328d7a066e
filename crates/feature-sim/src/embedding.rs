//! Feature extraction via ONNX Runtime.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::{DynamicImage, GenericImageView};
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;
use serde::{Deserialize, Serialize};

use crate::source::{load_image, ItemSource};
use crate::types::{FeatureStore, FeatureVector, SimilarityError, SimilarityResult};

/// ImageNet normalization constants used by DINOv2.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Anything that turns an image into a fixed-length feature vector.
pub trait FeatureExtractor {
    fn extract(&mut self, image: &DynamicImage) -> SimilarityResult<Vec<f32>>;
}

/// Image preprocessing pipeline applied before inference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preprocess {
    /// Target length of the shorter image side before cropping.
    pub resize_shorter: u32,
    /// Side of the square center crop fed to the model.
    pub crop: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for Preprocess {
    fn default() -> Self {
        Self {
            resize_shorter: 256,
            crop: 224,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }
}

impl Preprocess {
    /// Resize, center-crop, and normalize into an NCHW tensor `[1, 3, crop, crop]`.
    pub fn apply(&self, img: &DynamicImage) -> SimilarityResult<Array4<f32>> {
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            return Err(SimilarityError::Extraction(format!(
                "Cannot preprocess empty image ({w}x{h})"
            )));
        }

        let short = self.resize_shorter.max(self.crop);
        let (new_w, new_h) = if w <= h {
            (short, scale_side(h, short, w))
        } else {
            (scale_side(w, short, h), short)
        };

        let resized = img.resize_exact(new_w, new_h, image::imageops::FilterType::Triangle);
        let left = (new_w - self.crop) / 2;
        let top = (new_h - self.crop) / 2;
        let rgb = resized.crop_imm(left, top, self.crop, self.crop).to_rgb8();

        let size = self.crop as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
        for (x, y, pixel) in rgb.enumerate_pixels() {
            for c in 0..3usize {
                let val = pixel[c] as f32 / 255.0;
                tensor[[0, c, y as usize, x as usize]] = (val - self.mean[c]) / self.std[c];
            }
        }
        Ok(tensor)
    }
}

/// Scale `long` by `short_target / short`, rounding down.
fn scale_side(long: u32, short_target: u32, short: u32) -> u32 {
    ((long as u64 * short_target as u64) / short as u64) as u32
}

/// Everything the extractor needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub model_path: PathBuf,
    pub preprocess: Preprocess,
    /// Threads ONNX Runtime may use inside one operator.
    pub intra_threads: usize,
}

impl ExtractorConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            preprocess: Preprocess::default(),
            intra_threads: 1,
        }
    }
}

/// Feature extractor backed by an ONNX vision model (e.g. DINOv2 ViT-S/14).
pub struct OnnxExtractor {
    session: Session,
    preprocess: Preprocess,
}

impl OnnxExtractor {
    /// Load the model named by `config`.
    pub fn new(config: &ExtractorConfig) -> SimilarityResult<Self> {
        let path = &config.model_path;
        if !path.exists() {
            return Err(SimilarityError::ModelNotAvailable(format!(
                "no ONNX model at {}",
                path.display()
            )));
        }

        tracing::info!("Loading ONNX model from {}", path.display());

        let session = Session::builder()
            .and_then(|b| Ok(b.with_intra_threads(config.intra_threads.max(1))?))
            .and_then(|mut b| b.commit_from_file(path))
            .map_err(|e| SimilarityError::Extraction(format!("Failed to load ONNX model: {e}")))?;

        tracing::info!("ONNX model loaded successfully");
        Ok(Self {
            session,
            preprocess: config.preprocess,
        })
    }
}

impl FeatureExtractor for OnnxExtractor {
    fn extract(&mut self, image: &DynamicImage) -> SimilarityResult<Vec<f32>> {
        let tensor = self.preprocess.apply(image)?;

        let input_tensor = Tensor::from_array(tensor).map_err(|e| {
            SimilarityError::Extraction(format!("Failed to create input tensor: {e}"))
        })?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| SimilarityError::Extraction(format!("ONNX inference failed: {e}")))?;

        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| SimilarityError::Extraction(format!("Failed to extract output: {e}")))?;

        Ok(data.to_vec())
    }
}

/// An item that could not be turned into a feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub id: String,
    pub reason: String,
}

/// Result of running an extractor over a batch of sources.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub store: FeatureStore,
    pub failures: Vec<ExtractionFailure>,
    /// Original pixel dimensions of each successfully processed image.
    pub image_sizes: BTreeMap<String, (u32, u32)>,
    pub elapsed: Duration,
}

/// Extract features for every source, keeping the successes in order.
///
/// Sources that fail to load or extract, or whose vector the store rejects
/// (empty, non-finite, repeated id), are logged and reported in `failures`;
/// they do not stop the batch. A vector whose dimension differs from the
/// ones before it does.
pub fn extract_all<E>(extractor: &mut E, sources: &[ItemSource]) -> SimilarityResult<ExtractionOutcome>
where
    E: FeatureExtractor + ?Sized,
{
    let started = Instant::now();
    let mut store = FeatureStore::new();
    let mut failures = Vec::new();
    let mut image_sizes = BTreeMap::new();

    for (i, source) in sources.iter().enumerate() {
        tracing::debug!("[{}/{}] extracting {}", i + 1, sources.len(), source.id);

        let extracted = load_image(&source.path)
            .and_then(|img| extractor.extract(&img).map(|values| (img.dimensions(), values)));

        match extracted {
            Ok((size, values)) => {
                let mut vector = FeatureVector::new(source.id.clone(), values);
                vector.label = source.label.clone();
                match store.insert(vector) {
                    Ok(()) => {
                        image_sizes.insert(source.id.clone(), size);
                    }
                    Err(
                        e @ (SimilarityError::EmptyVector(_)
                        | SimilarityError::NonFiniteValue { .. }
                        | SimilarityError::DuplicateId(_)),
                    ) => skip(&mut failures, source, e),
                    Err(e) => return Err(e),
                }
            }
            Err(e) => skip(&mut failures, source, e),
        }
    }

    let elapsed = started.elapsed();
    tracing::info!(
        "Extracted {} of {} items in {:.2?}",
        store.len(),
        sources.len(),
        elapsed
    );

    Ok(ExtractionOutcome {
        store,
        failures,
        image_sizes,
        elapsed,
    })
}

fn skip(failures: &mut Vec<ExtractionFailure>, source: &ItemSource, e: SimilarityError) {
    tracing::warn!("Skipping {}: {e}", source.path.display());
    failures.push(ExtractionFailure {
        id: source.id.clone(),
        reason: e.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mean RGB of the image, as a 3-d feature.
    struct MeanColor;

    impl FeatureExtractor for MeanColor {
        fn extract(&mut self, image: &DynamicImage) -> SimilarityResult<Vec<f32>> {
            let rgb = image.to_rgb8();
            let n = (rgb.width() * rgb.height()) as f32;
            let mut sums = [0.0f32; 3];
            for pixel in rgb.pixels() {
                for c in 0..3 {
                    sums[c] += pixel[c] as f32;
                }
            }
            Ok(sums.iter().map(|s| s / n).collect())
        }
    }

    fn solid(dir: &std::path::Path, name: &str, color: [u8; 3]) -> ItemSource {
        let img = image::RgbImage::from_pixel(8, 6, image::Rgb(color));
        let path = dir.join(format!("{name}.png"));
        img.save(&path).unwrap();
        ItemSource::new(name, path)
    }

    #[test]
    fn test_preprocess_shape_and_normalization() {
        let img = DynamicImage::new_rgb8(640, 480);
        let tensor = Preprocess::default().apply(&img).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);

        // Black pixels map to -mean/std per channel.
        for c in 0..3 {
            let expected = -IMAGENET_MEAN[c] / IMAGENET_STD[c];
            assert!((tensor[[0, c, 100, 100]] - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_preprocess_small_and_tall_images() {
        let pre = Preprocess::default();
        let tall = DynamicImage::new_rgb8(30, 200);
        assert_eq!(pre.apply(&tall).unwrap().shape(), &[1, 3, 224, 224]);

        let empty = DynamicImage::new_rgb8(0, 10);
        assert!(pre.apply(&empty).is_err());
    }

    #[test]
    fn test_missing_model() {
        let config = ExtractorConfig::new("/nonexistent/dinov2.onnx");
        assert!(matches!(
            OnnxExtractor::new(&config),
            Err(SimilarityError::ModelNotAvailable(_))
        ));
    }

    #[test]
    fn test_extract_all_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            solid(dir.path(), "red", [255, 0, 0]),
            ItemSource::new("ghost", dir.path().join("ghost.png")),
            solid(dir.path(), "green", [0, 255, 0]).with_label("green thing"),
        ];

        let outcome = extract_all(&mut MeanColor, &sources).unwrap();
        assert_eq!(outcome.store.ids(), vec!["red", "green"]);
        assert_eq!(outcome.store.dimension(), Some(3));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].id, "ghost");
        assert_eq!(outcome.image_sizes.get("red"), Some(&(8, 6)));
        assert_eq!(
            outcome.store.get(1).and_then(|v| v.label.as_deref()),
            Some("green thing")
        );
    }

    #[test]
    fn test_extract_all_dimension_mismatch_is_fatal() {
        struct Growing(usize);
        impl FeatureExtractor for Growing {
            fn extract(&mut self, _image: &DynamicImage) -> SimilarityResult<Vec<f32>> {
                self.0 += 1;
                Ok(vec![1.0; self.0])
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            solid(dir.path(), "a", [1, 2, 3]),
            solid(dir.path(), "b", [4, 5, 6]),
        ];
        assert!(matches!(
            extract_all(&mut Growing(0), &sources),
            Err(SimilarityError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_extract_all_skips_rejected_vectors() {
        /// NaN for green images, empty output for blue ones.
        struct Picky;
        impl FeatureExtractor for Picky {
            fn extract(&mut self, image: &DynamicImage) -> SimilarityResult<Vec<f32>> {
                let px = image.to_rgb8().get_pixel(0, 0).0;
                if px[1] > 128 {
                    Ok(vec![f32::NAN, 1.0, 1.0])
                } else if px[2] > 128 {
                    Ok(Vec::new())
                } else {
                    Ok(vec![px[0] as f32, 1.0, 1.0])
                }
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            solid(dir.path(), "a", [200, 0, 0]),
            solid(dir.path(), "b", [0, 255, 0]),
            solid(dir.path(), "c", [0, 0, 255]),
            solid(dir.path(), "d", [100, 0, 0]),
            ItemSource::new("a", dir.path().join("a.png")),
        ];

        let outcome = extract_all(&mut Picky, &sources).unwrap();
        assert_eq!(outcome.store.ids(), vec!["a", "d"]);
        let skipped: Vec<&str> = outcome.failures.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(skipped, vec!["b", "c", "a"]);
        assert_eq!(outcome.image_sizes.len(), 2);
    }
}
