use ndarray::Array2;

use crate::shared::gray_frame::GrayFrame;

/// Summed-area tables of pixel values and squared pixel values.
///
/// Both tables have one extra leading row and column of zeros, so the
/// sum over any axis-aligned rectangle costs four lookups.
pub struct IntegralImage {
    sum: Array2<i64>,
    sq_sum: Array2<f64>,
    width: u32,
    height: u32,
}

impl IntegralImage {
    pub fn new(frame: &GrayFrame) -> Self {
        let w = frame.width() as usize;
        let h = frame.height() as usize;
        let pixels = frame.as_ndarray();

        let mut sum = Array2::<i64>::zeros((h + 1, w + 1));
        let mut sq_sum = Array2::<f64>::zeros((h + 1, w + 1));
        for y in 0..h {
            let mut row_sum = 0i64;
            let mut row_sq = 0f64;
            for x in 0..w {
                let v = pixels[[y, x]] as i64;
                row_sum += v;
                row_sq += (v * v) as f64;
                sum[[y + 1, x + 1]] = sum[[y, x + 1]] + row_sum;
                sq_sum[[y + 1, x + 1]] = sq_sum[[y, x + 1]] + row_sq;
            }
        }

        Self {
            sum,
            sq_sum,
            width: frame.width(),
            height: frame.height(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sum of pixels in the `w x h` rectangle at `(x, y)`.
    pub fn rect_sum(&self, x: u32, y: u32, w: u32, h: u32) -> i64 {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        self.sum[[y1, x1]] - self.sum[[y0, x1]] - self.sum[[y1, x0]] + self.sum[[y0, x0]]
    }

    /// Sum of squared pixels in the `w x h` rectangle at `(x, y)`.
    pub fn rect_sq_sum(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        self.sq_sum[[y1, x1]] - self.sq_sum[[y0, x1]] - self.sq_sum[[y1, x0]]
            + self.sq_sum[[y0, x0]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame_3x2() -> GrayFrame {
        // 1 2 3
        // 4 5 6
        GrayFrame::new(vec![1, 2, 3, 4, 5, 6], 3, 2)
    }

    #[test]
    fn test_full_sum() {
        let ii = IntegralImage::new(&frame_3x2());
        assert_eq!(ii.rect_sum(0, 0, 3, 2), 21);
        assert_relative_eq!(ii.rect_sq_sum(0, 0, 3, 2), 91.0);
    }

    #[test]
    fn test_sub_rectangles() {
        let ii = IntegralImage::new(&frame_3x2());
        assert_eq!(ii.rect_sum(1, 0, 2, 2), 2 + 3 + 5 + 6);
        assert_eq!(ii.rect_sum(0, 1, 3, 1), 15);
        assert_eq!(ii.rect_sum(2, 1, 1, 1), 6);
        assert_relative_eq!(ii.rect_sq_sum(1, 1, 2, 1), 25.0 + 36.0);
    }

    #[test]
    fn test_empty_rectangle_is_zero() {
        let ii = IntegralImage::new(&frame_3x2());
        assert_eq!(ii.rect_sum(1, 1, 0, 1), 0);
    }

    #[test]
    fn test_uniform_frame() {
        let ii = IntegralImage::new(&GrayFrame::filled(10, 10, 255));
        assert_eq!(ii.rect_sum(0, 0, 10, 10), 255 * 100);
        assert_eq!(ii.rect_sum(3, 4, 5, 2), 255 * 10);
        assert_eq!((ii.width(), ii.height()), (10, 10));
    }
}
