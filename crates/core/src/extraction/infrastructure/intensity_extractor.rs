use crate::extraction::domain::feature_extractor::{ExtractionError, FeatureExtractor};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::FEATURE_RESOLUTION;
use crate::shared::feature_vector::FeatureVector;
use crate::shared::gray_frame::GrayFrame;

/// Crop, bilinear-resize to a fixed square, flatten row-major.
///
/// This is a raw-intensity descriptor, not a learned embedding.
pub struct IntensityFeatureExtractor {
    resolution: u32,
}

impl IntensityFeatureExtractor {
    pub fn new() -> Self {
        Self::with_resolution(FEATURE_RESOLUTION)
    }

    pub fn with_resolution(resolution: u32) -> Self {
        Self {
            resolution: resolution.max(1),
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }
}

impl Default for IntensityFeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for IntensityFeatureExtractor {
    fn extract(
        &self,
        frame: &GrayFrame,
        bbox: &BoundingBox,
    ) -> Result<FeatureVector, ExtractionError> {
        let crop = frame.crop(bbox).ok_or(ExtractionError {
            bbox: *bbox,
            width: frame.width(),
            height: frame.height(),
        })?;
        let canonical = crop.resize(self.resolution, self.resolution);
        Ok(FeatureVector::new(canonical.into_data()))
    }
}
