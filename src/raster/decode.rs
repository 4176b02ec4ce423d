// Raster adapter for direct image inputs: bytes -> DynamicImage

use image::DynamicImage;

use crate::batch::formats::{FileKind, classify};
use crate::error::JpegTargetError;

/// Decode image bytes named `name` into a raster.
///
/// Format detection is left to the image crate (content sniffing); the name is
/// only consulted to reject HEIC/HEIF, which have no decoder here. Animated
/// GIFs yield their first frame.
pub fn decode_image(name: &str, bytes: &[u8]) -> crate::error::Result<DynamicImage> {
    if classify(name) == FileKind::UnsupportedImage {
        return Err(JpegTargetError::unsupported("HEIC/HEIF decoder not available"));
    }

    let image = image::load_from_memory(bytes)
        .map_err(|e| JpegTargetError::decode(e.to_string()))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(JpegTargetError::decode("image has zero size"));
    }

    Ok(image)
}
