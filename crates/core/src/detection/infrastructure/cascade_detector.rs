use std::sync::Arc;

use crate::detection::domain::detection_params::{DetectionParams, InvalidDetectionParams};
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::haar_cascade::HaarCascade;
use crate::detection::infrastructure::integral_image::IntegralImage;
use crate::detection::infrastructure::neighbor_grouping::{group_rectangles, Rect, GROUP_EPS};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::gray_frame::GrayFrame;

/// Multiscale sliding-window face detector over a Haar cascade.
///
/// The cascade is shared behind an `Arc` so it is parsed once and reused
/// by every call and every clone of the detector.
pub struct CascadeDetector {
    cascade: Arc<HaarCascade>,
    params: DetectionParams,
}

impl CascadeDetector {
    pub fn new(
        cascade: Arc<HaarCascade>,
        params: DetectionParams,
    ) -> Result<Self, InvalidDetectionParams> {
        params.validate()?;
        Ok(Self { cascade, params })
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    /// Raw cascade hits in source-image coordinates, before grouping.
    ///
    /// The image is shrunk by `scale_factor` per step while the model
    /// window stays fixed, so each step finds faces `scale_factor` times
    /// larger than the last. Scanning stops once the scaled-up window is
    /// larger than the source image, or the shrunken image no longer fits
    /// the model window.
    pub fn scan(&self, frame: &GrayFrame) -> Vec<Rect> {
        let (win_w, win_h) = self.cascade.window_size();
        let (min_w, min_h) = self.params.min_size;
        let mut candidates = Vec::new();

        let mut factor = 1.0f64;
        loop {
            let window_w = (win_w as f64 * factor).round() as u32;
            let window_h = (win_h as f64 * factor).round() as u32;
            let scaled_w = (frame.width() as f64 / factor).round() as u32;
            let scaled_h = (frame.height() as f64 / factor).round() as u32;
            if window_w > frame.width() || window_h > frame.height() {
                break;
            }
            if scaled_w < win_w || scaled_h < win_h {
                break;
            }

            if window_w >= min_w && window_h >= min_h {
                let scaled = frame.resize(scaled_w, scaled_h);
                let ii = IntegralImage::new(&scaled);
                let step = if factor > 2.0 { 1 } else { 2 };
                for y in (0..=scaled_h - win_h).step_by(step) {
                    for x in (0..=scaled_w - win_w).step_by(step) {
                        if self.cascade.evaluate(&ii, x, y) {
                            candidates.push(Rect {
                                x: (x as f64 * factor).round() as i32,
                                y: (y as f64 * factor).round() as i32,
                                width: window_w as i32,
                                height: window_h as i32,
                            });
                        }
                    }
                }
            }

            factor *= self.params.scale_factor;
        }

        candidates
    }
}

impl FaceDetector for CascadeDetector {
    fn detect(&self, frame: &GrayFrame) -> Vec<BoundingBox> {
        let candidates = self.scan(frame);
        let grouped = group_rectangles(&candidates, self.params.min_neighbors, GROUP_EPS);
        log::debug!(
            "cascade scan of {}x{}: {} candidates, {} faces",
            frame.width(),
            frame.height(),
            candidates.len(),
            grouped.len()
        );

        grouped
            .iter()
            .filter_map(|g| {
                BoundingBox::from_rect(g.rect.x, g.rect.y, g.rect.width, g.rect.height)
                    .ok()
                    .and_then(|b| b.clamp_to(frame.width(), frame.height()))
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::detection::infrastructure::haar_cascade::tests::bright_centre_cascade;
    use crate::detection::infrastructure::haar_cascade::{HaarFeature, Stage, WeakTree, WeightedRect};

    pub(crate) const PATCH: (i32, i32, i32, i32) = (56, 46, 104, 94);

    /// Black 160x140 frame with a 24x24 white square centred in `PATCH`.
    pub(crate) fn synthetic_face_frame() -> GrayFrame {
        let (w, h) = (160u32, 140u32);
        let mut data = vec![0u8; (w * h) as usize];
        for y in 58..82 {
            for x in 68..92 {
                data[y * w as usize + x] = 255;
            }
        }
        GrayFrame::new(data, w, h)
    }

    fn detector(params: DetectionParams) -> CascadeDetector {
        CascadeDetector::new(Arc::new(bright_centre_cascade(1.0)), params).unwrap()
    }

    #[test]
    fn test_rejects_invalid_params() {
        let params = DetectionParams {
            scale_factor: 1.0,
            ..DetectionParams::default()
        };
        assert!(CascadeDetector::new(Arc::new(bright_centre_cascade(1.0)), params).is_err());
    }

    #[test]
    fn test_blank_frame_has_no_faces() {
        let faces = detector(DetectionParams::default()).detect(&GrayFrame::filled(120, 100, 128));
        assert!(faces.is_empty());
    }

    #[test]
    fn test_frame_smaller_than_window_has_no_faces() {
        let faces = detector(DetectionParams::default()).detect(&GrayFrame::filled(20, 20, 0));
        assert!(faces.is_empty());
    }

    #[test]
    fn test_synthetic_face_is_located() {
        let frame = synthetic_face_frame();
        let faces = detector(DetectionParams::default()).detect(&frame);
        assert_eq!(faces.len(), 1, "faces: {faces:?}");

        let found = faces[0];
        let expected = BoundingBox::new(PATCH.0, PATCH.1, PATCH.2, PATCH.3).unwrap();
        let (fx, fy) = found.center();
        let (ex, ey) = expected.center();
        assert!((fx - ex).abs() <= 8.0 && (fy - ey).abs() <= 8.0, "found {found:?}");
        // The bright core must be inside the reported box.
        assert!(found.left() <= 68 && found.top() <= 58, "found {found:?}");
        assert!(found.right() >= 92 && found.bottom() >= 82, "found {found:?}");
        assert!(found.fits_within(frame.width(), frame.height()));
    }

    #[test]
    fn test_candidates_exceed_neighbor_threshold() {
        let candidates = detector(DetectionParams::default()).scan(&synthetic_face_frame());
        assert!(candidates.len() > 5, "only {} candidates", candidates.len());
    }

    /// Accepts every window, so `scan` reports each position it visits.
    fn accept_all_detector(scale_factor: f64) -> CascadeDetector {
        let feature = HaarFeature::new(vec![WeightedRect {
            x: 0,
            y: 0,
            width: 24,
            height: 24,
            weight: 1.0,
        }]);
        let stage = Stage::new(-1.0, vec![WeakTree::stump(0, 0.0, 0.0, 0.0)]);
        let cascade = HaarCascade::new(24, 24, vec![stage], vec![feature]).unwrap();
        let params = DetectionParams {
            scale_factor,
            min_size: (1, 1),
            ..DetectionParams::default()
        };
        CascadeDetector::new(Arc::new(cascade), params).unwrap()
    }

    #[test]
    fn test_scan_stops_when_window_outgrows_image() {
        // At factor 1.0625 the window rounds up to 26 > 25, while the
        // shrunken image (round(25 / 1.0625) = 24) would still fit the model.
        let candidates = accept_all_detector(1.0625).scan(&GrayFrame::filled(25, 25, 90));
        assert_eq!(candidates.len(), 1, "candidates: {candidates:?}");
        assert_eq!((candidates[0].width, candidates[0].height), (24, 24));
    }

    #[test]
    fn test_scan_covers_every_fitting_scale() {
        let candidates = accept_all_detector(1.25).scan(&GrayFrame::filled(30, 30, 90));
        let mut widths: Vec<i32> = candidates.iter().map(|c| c.width).collect();
        widths.dedup();
        assert_eq!(widths, [24, 30]);
    }

    #[test]
    fn test_min_size_suppresses_small_faces() {
        let params = DetectionParams {
            min_size: (100, 100),
            ..DetectionParams::default()
        };
        assert!(detector(params).detect(&synthetic_face_frame()).is_empty());
    }

    #[test]
    fn test_high_neighbor_threshold_suppresses_detection() {
        let params = DetectionParams {
            min_neighbors: 10_000,
            ..DetectionParams::default()
        };
        assert!(detector(params).detect(&synthetic_face_frame()).is_empty());
    }

    #[test]
    fn test_zero_neighbors_returns_every_candidate() {
        let params = DetectionParams {
            min_neighbors: 0,
            ..DetectionParams::default()
        };
        let d = detector(params);
        let frame = synthetic_face_frame();
        assert_eq!(d.detect(&frame).len(), d.scan(&frame).len());
    }

    #[test]
    fn test_detection_is_deterministic() {
        let d = detector(DetectionParams::default());
        let frame = synthetic_face_frame();
        assert_eq!(d.detect(&frame), d.detect(&frame));
    }
}
