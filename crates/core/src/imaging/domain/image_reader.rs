use std::path::{Path, PathBuf};

use image::DynamicImage;
use thiserror::Error;

use crate::shared::gray_frame::GrayFrame;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Undecodable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {path} has zero dimensions")]
    ZeroDimensions { path: PathBuf },
}

/// Domain interface for turning an image file into pixels.
///
/// Paths are assumed to be validated by the caller (exists, readable,
/// accepted extension); anything that still fails to decode is a
/// [`DecodeError`] for that one image.
pub trait ImageReader: Send + Sync {
    /// Decodes the file and converts it to 8-bit grayscale.
    fn read_gray(&self, path: &Path) -> Result<GrayFrame, DecodeError>;

    /// Decodes the file keeping its original colour layout.
    fn read_color(&self, path: &Path) -> Result<DynamicImage, DecodeError>;
}
