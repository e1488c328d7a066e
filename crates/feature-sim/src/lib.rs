//! feature-sim — similarity analysis over image embeddings: all-pairs matrix, nearest neighbors, threshold grouping, and statistics.

pub mod analysis;
pub mod archive;
pub mod cluster;
pub mod embedding;
pub mod extreme;
pub mod matrix;
pub mod similarity;
pub mod source;
pub mod stats;
pub mod types;

pub use analysis::{analyze, AnalysisOptions, DEFAULT_THRESHOLD};
pub use archive::{ArchiveReader, ArchiveWriter};
pub use cluster::cluster;
pub use embedding::{
    extract_all, ExtractionFailure, ExtractionOutcome, ExtractorConfig, FeatureExtractor,
    OnnxExtractor, Preprocess,
};
pub use extreme::find_min;
pub use matrix::SimilarityMatrix;
pub use similarity::{cosine_similarity, rank_neighbors};
pub use source::{discover_images, load_image, load_labels, ItemSource, PHOTO_EXTENSIONS};
pub use stats::{Cohesion, FeatureSetStats, MatrixStats, VectorStats};
pub use types::*;
