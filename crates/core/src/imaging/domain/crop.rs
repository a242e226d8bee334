use std::path::Path;

use image::{DynamicImage, GenericImageView};

use crate::imaging::domain::image_reader::{DecodeError, ImageReader};
use crate::shared::bounding_box::BoundingBox;

/// Decodes `path` in colour and crops `bbox` out of it with [`crop_padded`].
pub fn crop_image_file(
    reader: &dyn ImageReader,
    path: &Path,
    bbox: &BoundingBox,
) -> Result<DynamicImage, DecodeError> {
    let image = reader.read_color(path)?;
    Ok(crop_padded(&image, bbox))
}

/// Cuts `bbox` out of `image`, keeping the colour type.
///
/// The result is always `bbox.width() x bbox.height()`; parts of the box
/// outside the source are zero-filled.
pub fn crop_padded(image: &DynamicImage, bbox: &BoundingBox) -> DynamicImage {
    let (img_w, img_h) = image.dimensions();
    if bbox.fits_within(img_w, img_h) {
        return image.crop_imm(
            bbox.left() as u32,
            bbox.top() as u32,
            bbox.width(),
            bbox.height(),
        );
    }

    let mut canvas = DynamicImage::new(bbox.width(), bbox.height(), image.color());
    if let Some(visible) = bbox.clamp_to(img_w, img_h) {
        let overlap = image.crop_imm(
            visible.left() as u32,
            visible.top() as u32,
            visible.width(),
            visible.height(),
        );
        image::imageops::replace(
            &mut canvas,
            &overlap,
            i64::from(visible.left()) - i64::from(bbox.left()),
            i64::from(visible.top()) - i64::from(bbox.top()),
        );
    }
    canvas
}
