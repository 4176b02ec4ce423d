// image crate: RGB raster -> JPEG bytes

use crate::error::JpegTargetError;
use image::RgbImage;
use std::io::Cursor;

/// Encode an RGB raster to baseline JPEG bytes at `quality` (1-100).
pub fn encode_rgb_to_jpeg(rgb: &RgbImage, quality: u8) -> crate::error::Result<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(JpegTargetError::encoding(format!(
            "JPEG quality must be 1-100, got {}",
            quality
        )));
    }

    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(JpegTargetError::encoding(format!(
            "cannot encode empty {}x{} raster",
            rgb.width(),
            rgb.height()
        )));
    }

    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)?;

    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_jpeg_magic() {
        let rgb = RgbImage::from_pixel(16, 16, image::Rgb([200, 30, 30]));
        let bytes = encode_rgb_to_jpeg(&rgb, 80).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_rejects_out_of_range_quality() {
        let rgb = RgbImage::new(4, 4);
        assert!(encode_rgb_to_jpeg(&rgb, 0).is_err());
        assert!(encode_rgb_to_jpeg(&rgb, 101).is_err());
    }
}
