use serde::{Deserialize, Serialize};

use crate::encryption::domain::payload_cipher::EncryptedBlob;
use crate::shared::bounding_box::BoundingBox;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub location: BoundingBox,
    pub features: EncryptedBlob,
}

/// Faces found in one image, in detector order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub num_faces: usize,
    pub faces: Vec<DetectedFace>,
}

impl DetectionResult {
    pub fn new(faces: Vec<DetectedFace>) -> Self {
        Self {
            num_faces: faces.len(),
            faces,
        }
    }
}
