// Binary search over encoder quality for the largest output under a byte bound.

use image::RgbImage;
use tracing::trace;

use super::jpeg::encode_rgb_to_jpeg;

/// Highest quality found whose encoding fits the bound.
#[derive(Debug, Clone)]
pub struct QualityFit {
    pub payload: Vec<u8>,
    pub quality: u8,
}

/// Search `[q_min, q_max]` for the highest JPEG quality whose encoding of
/// `image` is at most `upper_bound_bytes`.
///
/// Returns `Ok(None)` when nothing on the search path fits.
pub fn search_quality(
    image: &RgbImage,
    upper_bound_bytes: usize,
    q_min: u8,
    q_max: u8,
) -> crate::error::Result<Option<QualityFit>> {
    search_quality_with(
        |quality| encode_rgb_to_jpeg(image, quality),
        upper_bound_bytes,
        q_min,
        q_max,
    )
}

/// [`search_quality`] over an arbitrary encoder.
///
/// Assumes encoded size is non-decreasing in quality. Where an encoder
/// violates that, the search may miss a fitting quality a linear scan would find.
pub fn search_quality_with<F>(
    mut encode: F,
    upper_bound_bytes: usize,
    q_min: u8,
    q_max: u8,
) -> crate::error::Result<Option<QualityFit>>
where
    F: FnMut(u8) -> crate::error::Result<Vec<u8>>,
{
    let mut lo = i32::from(q_min);
    let mut hi = i32::from(q_max);
    let mut best: Option<QualityFit> = None;

    while lo <= hi {
        let mid = (lo + hi) / 2;
        let quality = mid as u8;
        let payload = encode(quality)?;
        trace!(quality, bytes = payload.len(), upper_bound_bytes, "quality trial");

        if payload.len() <= upper_bound_bytes {
            best = Some(QualityFit { payload, quality });
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }

    Ok(best)
}
