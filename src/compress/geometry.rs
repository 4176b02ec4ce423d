// Resample engine: scale factor / minimum shortest side, optional sharpening.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};

/// Alpha-composite `image` onto an opaque white background.
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = u32::from(a);
        let over_white = |c: u8| ((u32::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([over_white(r), over_white(g), over_white(b)])
    })
}

/// Target dimensions for `scale`, rounded and clamped to at least 1x1.
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let scale_side = |side: u32| ((f64::from(side) * scale).round() as u32).max(1);
    (scale_side(width), scale_side(height))
}

/// Resample `image` by `scale` with Lanczos3, then sharpen when requested.
///
/// Sharpening is skipped when `amount <= 0`.
pub fn resize_to_scale(image: &RgbImage, scale: f64, sharpen: bool, amount: f32) -> RgbImage {
    let (width, height) = scaled_dimensions(image.width(), image.height(), scale);
    let resized = imageops::resize(image, width, height, FilterType::Lanczos3);

    if sharpen && amount > 0.0 {
        imageops::unsharpen(&resized, amount, 0)
    } else {
        resized
    }
}

/// Grow `image` so its shortest side is at least `min_side`. Never shrinks.
///
/// Images already meeting the floor are returned as-is.
pub fn ensure_min_side(image: RgbImage, min_side: u32, sharpen: bool, amount: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    if width >= min_side && height >= min_side {
        return image;
    }

    let shortest = width.min(height).max(1);
    let scale = (f64::from(min_side) / f64::from(shortest)).max(1.0);
    resize_to_scale(&image, scale, sharpen, amount)
}
