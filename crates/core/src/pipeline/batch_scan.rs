use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::pipeline::detection_result::DetectionResult;
use crate::pipeline::face_pipeline::{FacePipeline, PipelineError};
use crate::shared::constants::IMAGE_EXTENSIONS;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScanEntry {
    pub filename: String,
    pub faces_detected: usize,
    pub detection: DetectionResult,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    pub filename: String,
    pub error: String,
}

/// Outcome of a batch: one entry per image, successes and failures kept apart.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScanReport {
    pub results: Vec<ScanEntry>,
    pub errors: Vec<ScanFailure>,
    pub total_processed: usize,
    pub total_errors: usize,
}

impl ScanReport {
    fn push_result(&mut self, filename: String, detection: DetectionResult) {
        self.results.push(ScanEntry {
            filename,
            faces_detected: detection.num_faces,
            detection,
        });
        self.total_processed = self.results.len();
    }

    fn push_error(&mut self, filename: String, error: String) {
        self.errors.push(ScanFailure { filename, error });
        self.total_errors = self.errors.len();
    }
}

impl FacePipeline {
    /// Runs detection over `paths` in order. A failing image is recorded and
    /// the batch moves on.
    pub fn detect_batch(&self, paths: &[PathBuf]) -> ScanReport {
        let mut report = ScanReport::default();
        for path in paths {
            let filename = display_name(path);
            match self.detect_faces(path) {
                Ok(detection) => report.push_result(filename, detection),
                Err(e) => {
                    log::warn!("Error processing {filename}: {e}");
                    report.push_error(filename, e.to_string());
                }
            }
        }
        log::info!(
            "Batch finished: {} processed, {} errors",
            report.total_processed,
            report.total_errors
        );
        report
    }

    /// Scans the image files directly inside `dir` (sorted by name).
    ///
    /// Only a missing or unreadable directory fails the scan as a whole.
    pub fn scan_directory(&self, dir: &Path) -> Result<ScanReport, PipelineError> {
        let paths = image_files(dir)?;
        log::info!("Scanning {} ({} images)", dir.display(), paths.len());
        Ok(self.detect_batch(&paths))
    }
}

fn image_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let scan_err = |source| PipelineError::Scan {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(scan_err)? {
        let path = entry.map_err(scan_err)?.path();
        if path.is_file() && has_image_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
