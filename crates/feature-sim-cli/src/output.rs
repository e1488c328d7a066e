//! Results and feature files written after a run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use feature_sim::{AnalysisReport, ArchiveWriter, ExtractionFailure};

use crate::frontend::Run;

/// On-disk shape of a results file: the report plus run metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultsFile {
    pub generated_at: DateTime<Utc>,
    pub source_kind: String,
    pub source: String,
    pub extraction_secs: f64,
    #[serde(default)]
    pub failures: Vec<ExtractionFailure>,
    #[serde(default)]
    pub image_sizes: BTreeMap<String, (u32, u32)>,
    pub report: AnalysisReport,
}

impl ResultsFile {
    pub fn from_run(run: &Run) -> Self {
        Self {
            generated_at: Utc::now(),
            source_kind: run.kind.as_str().to_string(),
            source: run.source.clone(),
            extraction_secs: run.extraction_time.as_secs_f64(),
            failures: run.failures.clone(),
            image_sizes: run.image_sizes.clone(),
            report: run.report.clone(),
        }
    }
}

/// Paths written by [`save_run`].
#[derive(Debug, Clone)]
pub struct SavedFiles {
    pub results: PathBuf,
    pub features: Option<PathBuf>,
}

/// Write the results JSON and, optionally, the feature archive into `dir`.
pub fn save_run(run: &Run, dir: &Path, with_features: bool) -> anyhow::Result<SavedFiles> {
    std::fs::create_dir_all(dir)?;

    let results = dir.join(run.kind.results_filename());
    let json = serde_json::to_vec_pretty(&ResultsFile::from_run(run))?;
    std::fs::write(&results, json)?;
    tracing::info!("Wrote results to {}", results.display());

    let features = if with_features {
        let path = dir.join(run.kind.features_filename());
        ArchiveWriter::write_to_file(&run.store, &path)?;
        tracing::info!("Wrote features to {}", path.display());
        Some(path)
    } else {
        None
    };

    Ok(SavedFiles { results, features })
}
