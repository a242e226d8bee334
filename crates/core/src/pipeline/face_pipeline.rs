use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use thiserror::Error;

use crate::detection::domain::detection_params::InvalidDetectionParams;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::cascade_detector::CascadeDetector;
use crate::detection::infrastructure::haar_cascade::{CascadeError, HaarCascade};
use crate::detection::infrastructure::model_resolver::{resolve_cascade, ModelResolveError, ProgressFn};
use crate::encryption::domain::encryption_key::KeyError;
use crate::encryption::domain::key_provider::{KeyOrigin, KeyProvider};
use crate::encryption::domain::payload_cipher::{EncryptionError, PayloadCipher};
use crate::encryption::infrastructure::aes_gcm_cipher::AesGcmCipher;
use crate::encryption::infrastructure::configured_key_provider::ConfiguredKeyProvider;
use crate::extraction::domain::feature_extractor::{ExtractionError, FeatureExtractor};
use crate::extraction::infrastructure::intensity_extractor::IntensityFeatureExtractor;
use crate::imaging::domain::crop::crop_image_file;
use crate::imaging::domain::image_reader::{DecodeError, ImageReader};
use crate::imaging::infrastructure::image_file_reader::ImageFileReader;
use crate::matching::domain::match_outcome::MatchOutcome;
use crate::matching::domain::sealed_comparison::{compare_sealed, evaluate_sealed};
use crate::pipeline::detection_result::{DetectedFace, DetectionResult};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::config::ResolvedConfig;
use crate::shared::feature_vector::FeaturePayload;
use crate::shared::gray_frame::GrayFrame;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Encryption(#[from] EncryptionError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Cascade(#[from] CascadeError),
    #[error(transparent)]
    ModelResolve(#[from] ModelResolveError),
    #[error(transparent)]
    InvalidParams(#[from] InvalidDetectionParams),
    #[error("failed to scan directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Composition root: decode → detect → extract → encrypt, and
/// decrypt ×2 → match.
///
/// Every collaborator is immutable after construction and `Send + Sync`,
/// so one pipeline can serve concurrent callers through `&self`.
pub struct FacePipeline {
    reader: Box<dyn ImageReader>,
    detector: Box<dyn FaceDetector>,
    extractor: Box<dyn FeatureExtractor>,
    cipher: Box<dyn PayloadCipher>,
}

impl FacePipeline {
    pub fn new(
        reader: Box<dyn ImageReader>,
        detector: Box<dyn FaceDetector>,
        extractor: Box<dyn FeatureExtractor>,
        cipher: Box<dyn PayloadCipher>,
    ) -> Self {
        Self {
            reader,
            detector,
            extractor,
            cipher,
        }
    }

    /// Production wiring. The key comes from configuration or the
    /// configured environment variable; `progress` reports a cascade
    /// download if one is needed.
    pub fn from_config(
        config: &ResolvedConfig,
        progress: Option<ProgressFn>,
    ) -> Result<Self, PipelineError> {
        let provider = ConfiguredKeyProvider::from_env(
            config.encryption_key.clone(),
            &config.key_env,
            config.missing_key_policy(),
        );
        Self::from_config_with_key(config, &provider, progress)
    }

    /// Same as [`FacePipeline::from_config`] with a caller-chosen key source.
    ///
    /// The key is obtained before the cascade is resolved so a missing key
    /// fails before any download starts.
    pub fn from_config_with_key(
        config: &ResolvedConfig,
        key_provider: &dyn KeyProvider,
        progress: Option<ProgressFn>,
    ) -> Result<Self, PipelineError> {
        let provided = key_provider.provide()?;
        if provided.origin == KeyOrigin::Configured {
            log::debug!("Using configured encryption key");
        }

        let cascade_path = resolve_cascade(config.cascade_path.as_deref(), progress)?;
        let cascade = HaarCascade::from_file(&cascade_path)?;
        log::info!(
            "Loaded cascade {} ({} stages)",
            cascade_path.display(),
            cascade.stage_count()
        );
        let detector = CascadeDetector::new(Arc::new(cascade), config.detection)?;

        Ok(Self::new(
            Box::new(ImageFileReader::new()),
            Box::new(detector),
            Box::new(IntensityFeatureExtractor::new()),
            Box::new(AesGcmCipher::new(&provided.key)),
        ))
    }

    /// Detects faces in an already decoded frame and seals each face's
    /// features.
    pub fn detect(&self, frame: &GrayFrame) -> Result<DetectionResult, PipelineError> {
        let boxes = self.detector.detect(frame);
        let mut faces = Vec::with_capacity(boxes.len());
        for location in boxes {
            let features = self.extractor.extract(frame, &location)?;
            let blob = self.cipher.encrypt(&FeaturePayload::new(features))?;
            faces.push(DetectedFace {
                location,
                features: blob,
            });
        }
        Ok(DetectionResult::new(faces))
    }

    pub fn detect_faces(&self, path: &Path) -> Result<DetectionResult, PipelineError> {
        let frame = self.reader.read_gray(path)?;
        let result = self.detect(&frame)?;
        log::info!("Detected {} face(s) in {}", result.num_faces, path.display());
        Ok(result)
    }

    /// Colour crop of `bbox`, exactly `bbox.width() x bbox.height()`.
    pub fn crop_face(&self, path: &Path, bbox: &BoundingBox) -> Result<DynamicImage, PipelineError> {
        Ok(crop_image_file(self.reader.as_ref(), path, bbox)?)
    }

    /// Decrypts both blobs and compares their features. Never fails;
    /// anything that prevents a similarity is reported as indeterminate.
    pub fn evaluate_faces(&self, blob_a: &str, blob_b: &str, threshold: f64) -> MatchOutcome {
        evaluate_sealed(self.cipher.as_ref(), blob_a, blob_b, threshold)
    }

    /// `true` only for a definite match; indeterminate comparisons are
    /// logged and reported as `false`.
    pub fn compare_faces(&self, blob_a: &str, blob_b: &str, threshold: f64) -> bool {
        compare_sealed(self.cipher.as_ref(), blob_a, blob_b, threshold)
    }
}
