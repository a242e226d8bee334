use image::imageops::FilterType;
use image::GrayImage;
use ndarray::ArrayView2;

use crate::shared::bounding_box::BoundingBox;

/// A decoded single-channel 8-bit image in row-major order.
///
/// Everything downstream of decoding (detection, feature extraction)
/// works on this type; colour only survives for cropping.
#[derive(Clone, Debug, PartialEq)]
pub struct GrayFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl GrayFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "data length must equal width * height"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self::new(vec![value; (width as usize) * (height as usize)], width, height)
    }

    pub fn from_luma(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height)
    }

    pub fn to_luma(&self) -> GrayImage {
        // Length is checked in `new`, so the buffer always fits.
        GrayImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_ndarray(&self) -> ArrayView2<'_, u8> {
        ArrayView2::from_shape((self.height as usize, self.width as usize), &self.data)
            .expect("GrayFrame data length must match dimensions")
    }

    /// Copies the pixels under `bbox`; `None` if the box leaves the frame.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<GrayFrame> {
        if !bbox.fits_within(self.width, self.height) {
            return None;
        }
        let (w, h) = (bbox.width() as usize, bbox.height() as usize);
        let stride = self.width as usize;
        let mut data = Vec::with_capacity(w * h);
        for row in bbox.top() as usize..bbox.bottom() as usize {
            let start = row * stride + bbox.left() as usize;
            data.extend_from_slice(&self.data[start..start + w]);
        }
        Some(GrayFrame::new(data, w as u32, h as u32))
    }

    /// Bilinear resample to `width x height`. Deterministic for equal input.
    pub fn resize(&self, width: u32, height: u32) -> GrayFrame {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let resized = image::imageops::resize(&self.to_luma(), width, height, FilterType::Triangle);
        GrayFrame::from_luma(resized)
    }
}
