use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid bounding box ({left}, {top}, {right}, {bottom}): right must exceed left and bottom must exceed top")]
pub struct InvalidBoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Rectangular pixel region locating a detected face.
///
/// Edges are exclusive on the right/bottom side, so `width = right - left`.
/// Construction validates the box is non-empty; whether it fits a given
/// image is checked separately with [`BoundingBox::fits_within`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBoundingBox", into = "RawBoundingBox")]
pub struct BoundingBox {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

#[derive(Serialize, Deserialize)]
struct RawBoundingBox {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl TryFrom<RawBoundingBox> for BoundingBox {
    type Error = InvalidBoundingBox;

    fn try_from(raw: RawBoundingBox) -> Result<Self, Self::Error> {
        BoundingBox::new(raw.left, raw.top, raw.right, raw.bottom)
    }
}

impl From<BoundingBox> for RawBoundingBox {
    fn from(b: BoundingBox) -> Self {
        RawBoundingBox {
            left: b.left,
            top: b.top,
            right: b.right,
            bottom: b.bottom,
        }
    }
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Result<Self, InvalidBoundingBox> {
        if right <= left || bottom <= top {
            return Err(InvalidBoundingBox {
                left,
                top,
                right,
                bottom,
            });
        }
        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Builds a box from an `(x, y, width, height)` rectangle.
    pub fn from_rect(x: i32, y: i32, width: i32, height: i32) -> Result<Self, InvalidBoundingBox> {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    pub fn left(&self) -> i32 {
        self.left
    }

    pub fn top(&self) -> i32 {
        self.top
    }

    pub fn right(&self) -> i32 {
        self.right
    }

    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    /// Any valid box spans at most `u32::MAX` pixels, so the widened
    /// difference always fits.
    pub fn width(&self) -> u32 {
        (i64::from(self.right) - i64::from(self.left)) as u32
    }

    pub fn height(&self) -> u32 {
        (i64::from(self.bottom) - i64::from(self.top)) as u32
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (f64::from(self.left) + f64::from(self.right)) / 2.0,
            (f64::from(self.top) + f64::from(self.bottom)) / 2.0,
        )
    }

    /// True when every edge lies within `[0, width] x [0, height]`.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.left >= 0
            && self.top >= 0
            && self.right as i64 <= width as i64
            && self.bottom as i64 <= height as i64
    }

    /// Clamps the box to the image; `None` if nothing of it remains.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let w = width.min(i32::MAX as u32) as i32;
        let h = height.min(i32::MAX as u32) as i32;
        BoundingBox::new(
            self.left.clamp(0, w),
            self.top.clamp(0, h),
            self.right.clamp(0, w),
            self.bottom.clamp(0, h),
        )
        .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn bbox(l: i32, t: i32, r: i32, b: i32) -> BoundingBox {
        BoundingBox::new(l, t, r, b).unwrap()
    }

    #[test]
    fn test_dimensions() {
        let b = bbox(10, 20, 110, 70);
        assert_eq!(b.width(), 100);
        assert_eq!(b.height(), 50);
        assert_eq!(b.center(), (60.0, 45.0));
    }

    #[rstest]
    #[case::zero_width(10, 10, 10, 20)]
    #[case::zero_height(10, 10, 20, 10)]
    #[case::inverted(20, 20, 10, 10)]
    fn test_rejects_empty_boxes(#[case] l: i32, #[case] t: i32, #[case] r: i32, #[case] b: i32) {
        assert!(BoundingBox::new(l, t, r, b).is_err());
    }

    #[test]
    fn test_from_rect() {
        let b = BoundingBox::from_rect(5, 6, 30, 40).unwrap();
        assert_eq!((b.left(), b.top(), b.right(), b.bottom()), (5, 6, 35, 46));
    }

    #[rstest]
    #[case::inside(bbox(10, 10, 90, 70), true)]
    #[case::touching_edges(bbox(0, 0, 100, 80), true)]
    #[case::negative_left(bbox(-1, 0, 50, 50), false)]
    #[case::past_right(bbox(10, 10, 101, 50), false)]
    #[case::past_bottom(bbox(10, 10, 50, 81), false)]
    fn test_fits_within(#[case] b: BoundingBox, #[case] expected: bool) {
        assert_eq!(b.fits_within(100, 80), expected);
    }

    #[test]
    fn test_clamp_to_trims_overhang() {
        let b = bbox(-5, -5, 50, 120).clamp_to(40, 100).unwrap();
        assert_eq!(b, bbox(0, 0, 40, 100));
    }

    #[test]
    fn test_clamp_to_outside_image_is_none() {
        assert!(bbox(200, 200, 250, 250).clamp_to(100, 100).is_none());
    }

    #[rstest]
    #[case::full_i32_range(i32::MIN, i32::MAX, u32::MAX, -0.5)]
    #[case::far_right(2_000_000_000, 2_100_000_000, 100_000_000, 2_050_000_000.0)]
    #[case::far_left(i32::MIN, i32::MIN + 10, 10, -2_147_483_643.0)]
    fn test_extreme_coordinates_do_not_overflow(
        #[case] left: i32,
        #[case] right: i32,
        #[case] width: u32,
        #[case] center_x: f64,
    ) {
        let b = bbox(left, 0, right, 10);
        assert_eq!(b.width(), width);
        assert_eq!(b.height(), 10);
        assert_relative_eq!(b.center().0, center_x);
        assert_relative_eq!(b.center().1, 5.0);
    }

    #[test]
    fn test_serializes_as_edge_object() {
        let json = serde_json::to_string(&bbox(1, 2, 3, 4)).unwrap();
        assert_eq!(json, r#"{"left":1,"top":2,"right":3,"bottom":4}"#);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: BoundingBox =
            serde_json::from_str(r#"{"left":1,"top":2,"right":3,"bottom":4}"#).unwrap();
        assert_eq!(ok, bbox(1, 2, 3, 4));
        let bad = serde_json::from_str::<BoundingBox>(r#"{"left":5,"top":2,"right":3,"bottom":4}"#);
        assert!(bad.is_err());
    }
}
