use thiserror::Error;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::feature_vector::FeatureVector;
use crate::shared::gray_frame::GrayFrame;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("face box {bbox:?} does not fit a {width}x{height} image")]
pub struct ExtractionError {
    pub bbox: BoundingBox,
    pub width: u32,
    pub height: u32,
}

/// Domain interface for turning a located face into a feature vector.
///
/// Implementations must be pure: the same pixels under the same box
/// always give the same vector.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, frame: &GrayFrame, bbox: &BoundingBox)
        -> Result<FeatureVector, ExtractionError>;
}
