use std::path::Path;

use image::{DynamicImage, RgbImage};

use crate::imaging::domain::image_reader::{DecodeError, ImageReader};
use crate::shared::gray_frame::GrayFrame;

/// Decodes image files with the `image` crate.
///
/// Grayscale conversion uses BT.601 luma weights in 14-bit fixed point,
/// not the Rec. 709 weights of `DynamicImage::to_luma8`, so feature
/// vectors stay comparable with ones produced by OpenCV-based tooling.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read_gray(&self, path: &Path) -> Result<GrayFrame, DecodeError> {
        let img = self.read_color(path)?;
        Ok(to_gray_bt601(&img.to_rgb8()))
    }

    fn read_color(&self, path: &Path) -> Result<DynamicImage, DecodeError> {
        let img = image::ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|source| DecodeError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .decode()
            .map_err(|source| DecodeError::Undecodable {
                path: path.to_path_buf(),
                source,
            })?;

        if img.width() == 0 || img.height() == 0 {
            return Err(DecodeError::ZeroDimensions {
                path: path.to_path_buf(),
            });
        }
        Ok(img)
    }
}

const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;

pub fn to_gray_bt601(rgb: &RgbImage) -> GrayFrame {
    let data = rgb
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            ((r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT + (1 << (SHIFT - 1)))
                >> SHIFT) as u8
        })
        .collect();
    GrayFrame::new(data, rgb.width(), rgb.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    fn write_test_image(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("test.png");
        let mut img = RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_read_gray_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 100, 80);
        let frame = ImageFileReader::new().read_gray(&path).unwrap();
        assert_eq!(frame.width(), 100);
        assert_eq!(frame.height(), 80);
    }

    #[test]
    fn test_read_gray_uses_bt601_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 4, 4);
        let frame = ImageFileReader::new().read_gray(&path).unwrap();
        // 0.299 * 50 + 0.587 * 100 + 0.114 * 200 = 96.25
        assert_eq!(frame.data()[0], 96);
    }

    #[rstest]
    #[case::black([0, 0, 0], 0)]
    #[case::white([255, 255, 255], 255)]
    #[case::gray([77, 77, 77], 77)]
    #[case::red([255, 0, 0], 76)]
    #[case::green([0, 255, 0], 150)]
    #[case::blue([0, 0, 255], 29)]
    fn test_to_gray_bt601(#[case] rgb: [u8; 3], #[case] expected: u8) {
        let img = RgbImage::from_pixel(1, 1, image::Rgb(rgb));
        assert_eq!(to_gray_bt601(&img).data(), &[expected]);
    }

    #[test]
    fn test_read_color_keeps_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 10, 10);
        let img = ImageFileReader::new().read_color(&path).unwrap();
        assert_eq!(img.to_rgb8().get_pixel(3, 3), &image::Rgb([50, 100, 200]));
    }

    #[test]
    fn test_nonexistent_file_is_io_error() {
        let err = ImageFileReader::new()
            .read_gray(Path::new("/nonexistent/test.png"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Io { .. }));
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\nthis is not really a png").unwrap();
        let err = ImageFileReader::new().read_gray(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Undecodable { .. }));
    }

    #[test]
    fn test_text_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"plain text, no image here").unwrap();
        assert!(ImageFileReader::new().read_gray(&path).is_err());
    }
}
