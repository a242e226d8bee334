use crate::shared::bounding_box::BoundingBox;
use crate::shared::gray_frame::GrayFrame;

/// Domain interface for face detection.
///
/// Implementations hold only immutable, pre-loaded state so a single
/// instance can serve concurrent callers through `&self`.
pub trait FaceDetector: Send + Sync {
    /// Returns face boxes in detection order. Boxes always fit the frame.
    fn detect(&self, frame: &GrayFrame) -> Vec<BoundingBox>;
}
