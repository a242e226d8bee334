use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SCALE_FACTOR: f64 = 1.1;
pub const DEFAULT_MIN_NEIGHBORS: usize = 5;
pub const DEFAULT_MIN_SIZE: (u32, u32) = (30, 30);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidDetectionParams {
    #[error("scale factor must be a finite value greater than 1.0, got {0}")]
    ScaleFactor(f64),
    #[error("minimum face size must be non-zero, got {0}x{1}")]
    MinSize(u32, u32),
}

/// Tuning knobs for the multiscale cascade search.
///
/// - `scale_factor`: window growth per pyramid step.
/// - `min_neighbors`: a detection needs strictly more overlapping
///   candidates than this to be kept; 0 returns raw candidates.
/// - `min_size`: smallest window (width, height) that is scanned at all.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    pub scale_factor: f64,
    pub min_neighbors: usize,
    pub min_size: (u32, u32),
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            min_size: DEFAULT_MIN_SIZE,
        }
    }
}

impl DetectionParams {
    pub fn validate(&self) -> Result<(), InvalidDetectionParams> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 1.0 {
            return Err(InvalidDetectionParams::ScaleFactor(self.scale_factor));
        }
        if self.min_size.0 == 0 || self.min_size.1 == 0 {
            return Err(InvalidDetectionParams::MinSize(self.min_size.0, self.min_size.1));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let params = DetectionParams::default();
        assert_relative_eq!(params.scale_factor, 1.1);
        assert_eq!(params.min_neighbors, 5);
        assert_eq!(params.min_size, (30, 30));
        assert!(params.validate().is_ok());
    }

    #[rstest]
    #[case::one(1.0)]
    #[case::shrinking(0.9)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn test_rejects_bad_scale_factor(#[case] scale_factor: f64) {
        let params = DetectionParams {
            scale_factor,
            ..DetectionParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(InvalidDetectionParams::ScaleFactor(_))
        ));
    }

    #[test]
    fn test_rejects_zero_min_size() {
        let params = DetectionParams {
            min_size: (0, 30),
            ..DetectionParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(InvalidDetectionParams::MinSize(0, 30))
        );
    }

    #[test]
    fn test_zero_neighbors_is_valid() {
        let params = DetectionParams {
            min_neighbors: 0,
            ..DetectionParams::default()
        };
        assert!(params.validate().is_ok());
    }
}
