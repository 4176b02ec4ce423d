// Size-targeted encoder: geometry, quality search and range orchestration.
//
// Test rasters are generated in-process (deterministic noise / solid fills)
// so no fixture files are needed.

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

use jpeg_target::compress::geometry::{
    ensure_min_side, flatten_onto_white, resize_to_scale, scaled_dimensions,
};
use jpeg_target::compress::jpeg::encode_rgb_to_jpeg;
use jpeg_target::compress::quality::search_quality;
use jpeg_target::compress::{Stage, compress_into_range};
use jpeg_target::config::compression::{CompressionConfig, SpeedPreset};
use jpeg_target::error::JpegTargetError;

/// Deterministic RGB noise (LCG), compresses poorly at every quality.
fn noise_image(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        };
        Rgb([next(), next(), next()])
    })
}

fn config(
    min_side: u32,
    max_upscale: f64,
    lower_kb: u64,
    upper_kb: u64,
    q_min: u8,
    q_max: u8,
) -> CompressionConfig {
    CompressionConfig::new(
        SpeedPreset::Fast,
        min_side,
        0.35,
        max_upscale,
        false,
        0.0,
        lower_kb,
        upper_kb,
    )
    .expect("valid config")
    .with_quality_range(q_min, q_max)
    .expect("valid quality range")
}

// ============================================================
// 1. Geometry
// ============================================================

#[test]
fn test_resize_scale_one_keeps_dimensions() {
    let img = noise_image(37, 23, 1);
    let out = resize_to_scale(&img, 1.0, false, 0.0);
    assert_eq!(out.dimensions(), (37, 23));
}

#[test]
fn test_resize_rounds_dimensions() {
    let img = noise_image(101, 51, 2);
    let out = resize_to_scale(&img, 0.5, false, 0.0);
    assert_eq!(out.dimensions(), scaled_dimensions(101, 51, 0.5));
    assert_eq!(out.dimensions(), (51, 26));
}

#[test]
fn test_resize_never_below_one_pixel() {
    let img = noise_image(10, 3, 3);
    let out = resize_to_scale(&img, 0.01, true, 1.0);
    assert_eq!(out.dimensions(), (1, 1));
}

#[test]
fn test_resize_sharpen_zero_amount_is_noop() {
    let img = noise_image(40, 40, 4);
    let plain = resize_to_scale(&img, 0.5, false, 0.0);
    let zero_amount = resize_to_scale(&img, 0.5, true, 0.0);
    assert_eq!(plain, zero_amount);
}

#[test]
fn test_ensure_min_side_identity_when_large_enough() {
    let img = noise_image(300, 260, 5);
    let out = ensure_min_side(img.clone(), 256, true, 1.0);
    assert_eq!(out, img, "no resample when both sides meet the floor");
}

#[test]
fn test_ensure_min_side_grows_shortest_side() {
    let img = noise_image(100, 50, 6);
    let out = ensure_min_side(img, 200, false, 0.0);
    assert_eq!(out.dimensions(), (400, 200));
}

#[test]
fn test_ensure_min_side_is_idempotent() {
    let img = noise_image(33, 17, 7);
    let once = ensure_min_side(img, 64, true, 1.0);
    let twice = ensure_min_side(once.clone(), 64, true, 1.0);
    assert_eq!(once.dimensions(), twice.dimensions());
    assert!(once.width().min(once.height()) >= 64);
}

#[test]
fn test_flatten_blends_half_alpha_toward_white() {
    let rgba = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
    let flat = flatten_onto_white(&DynamicImage::ImageRgba8(rgba));
    let [r, g, b] = flat.get_pixel(0, 0).0;
    assert_eq!((r, g, b), (127, 127, 127));
}

// ============================================================
// 2. Quality search against the real encoder
// ============================================================

#[test]
fn test_search_quality_result_fits_and_next_quality_does_not() {
    let img = noise_image(96, 96, 8);
    let upper = encode_rgb_to_jpeg(&img, 60).unwrap().len();

    let fit = search_quality(&img, upper, 15, 95)
        .unwrap()
        .expect("q=60 fits by construction");
    assert!(fit.payload.len() <= upper);
    assert!(fit.quality >= 60);
    if fit.quality < 95 {
        let next = encode_rgb_to_jpeg(&img, fit.quality + 1).unwrap();
        assert!(next.len() > upper, "search should return the highest fitting quality");
    }
}

#[test]
fn test_search_quality_not_found_when_q_min_overflows() {
    let img = noise_image(96, 96, 9);
    let q_min_size = encode_rgb_to_jpeg(&img, 15).unwrap().len();
    let fit = search_quality(&img, q_min_size - 1, 15, 15).unwrap();
    assert!(fit.is_none());
}

// ============================================================
// 3. Orchestrator regimes
// ============================================================

#[test]
fn test_fits_at_original_scale_returns_max_fitting_quality() {
    let img = noise_image(120, 90, 10);
    let q70 = encode_rgb_to_jpeg(&img, 70).unwrap().len();
    let upper_kb = q70.div_ceil(1024) as u64;
    let cfg = config(16, 2.0, 1, upper_kb, 15, 95);

    let expected = search_quality(&img, cfg.upper_bound_bytes(), 15, 95)
        .unwrap()
        .expect("fits at scale 1.0");

    let result = compress_into_range(&DynamicImage::ImageRgb8(img), &cfg).unwrap();
    assert_eq!(result.stage, Stage::Original);
    assert_eq!(result.scale, 1.0);
    assert_eq!(result.quality, expected.quality);
    assert_eq!(result.payload, expected.payload);
    assert_eq!(result.byte_len(), result.payload.len());
}

#[test]
fn test_shrinking_respects_upper_bound() {
    let img = noise_image(200, 200, 11);
    let q90_size = encode_rgb_to_jpeg(&img, 90).unwrap().len();
    let upper_kb = ((q90_size / 2) / 1024).max(1) as u64;
    let cfg = config(16, 2.0, 1, upper_kb, 90, 100);

    let result = compress_into_range(&DynamicImage::ImageRgb8(img), &cfg).unwrap();

    match result.stage {
        Stage::Shrunk => {
            assert!(result.byte_len() <= cfg.upper_bound_bytes());
            assert!(result.scale < 1.0);
            assert!(result.scale >= cfg.min_downscale());
            assert!((90..=100).contains(&result.quality));
        }
        Stage::Fallback => {
            assert_eq!(result.scale, cfg.min_downscale());
            assert_eq!(result.quality, 90);
        }
        other => panic!("full-size image cannot fit, got stage {other:?}"),
    }
}

#[test]
fn test_fallback_when_nothing_fits() {
    let img = noise_image(200, 200, 12);
    // q=100 noise at 70x70 is far above 1 KB.
    let cfg = config(16, 2.0, 1, 1, 100, 100);

    let result = compress_into_range(&DynamicImage::ImageRgb8(img), &cfg).unwrap();
    assert_eq!(result.stage, Stage::Fallback);
    assert_eq!(result.scale, 0.35);
    assert_eq!(result.quality, 100);
    assert!(result.byte_len() > cfg.upper_bound_bytes());

    let decoded = image::load_from_memory(&result.payload).expect("fallback is a valid JPEG");
    assert_eq!((decoded.width(), decoded.height()), (70, 70));
}

#[test]
fn test_fallback_respects_min_side_floor() {
    let img = noise_image(200, 100, 13);
    let cfg = config(64, 2.0, 1, 1, 100, 100);

    let result = compress_into_range(&DynamicImage::ImageRgb8(img), &cfg).unwrap();
    assert_eq!(result.stage, Stage::Fallback);
    let decoded = image::load_from_memory(&result.payload).unwrap();
    assert!(decoded.width().min(decoded.height()) >= 64);
}

#[test]
fn test_fit_below_floor_at_original_scale_is_not_upscaled() {
    let img = noise_image(64, 64, 14);
    let cfg = config(1, 2.0, 30, 40, 15, 95);

    let expected = search_quality(&img, cfg.upper_bound_bytes(), 15, 95)
        .unwrap()
        .expect("fits at scale 1.0");
    assert!(
        expected.payload.len() < cfg.lower_bound_bytes(),
        "scale-1.0 fit should land under the floor for this case"
    );

    let result = compress_into_range(&DynamicImage::ImageRgb8(img), &cfg).unwrap();
    assert_eq!(result.stage, Stage::Original);
    assert_eq!(result.scale, 1.0);
    assert_eq!(result.quality, expected.quality);
    assert_eq!(result.payload, expected.payload);
}

#[test]
fn test_no_growth_when_max_upscale_is_one() {
    let img = noise_image(64, 64, 15);
    let cfg = config(1, 1.0, 5_000, 10_000, 90, 95);

    let result = compress_into_range(&DynamicImage::ImageRgb8(img), &cfg).unwrap();
    assert_eq!(result.scale, 1.0);
}

/// Scaled-down version of the solid-colour end-to-end case: a flat image
/// compresses far under the floor but already fits the upper bound.
#[test]
fn test_solid_color_png_best_effort() {
    let solid = RgbImage::from_pixel(400, 300, Rgb([30, 120, 200]));
    let mut png = std::io::Cursor::new(Vec::new());
    solid.write_to(&mut png, image::ImageFormat::Png).unwrap();

    let decoded = image::load_from_memory(png.get_ref()).unwrap();
    let cfg = config(256, 2.0, 168, 174, 15, 95);
    let result = compress_into_range(&decoded, &cfg).unwrap();

    // A flat image fits at its original size, so it is returned untouched.
    assert_eq!(result.stage, Stage::Original, "unexpected result: {result:?}");
    assert_eq!(result.scale, 1.0);
    assert!(result.byte_len() <= cfg.upper_bound_bytes());
}

#[test]
fn test_transparent_input_is_flattened() {
    let rgba = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 0]));
    let cfg = config(16, 1.0, 1, 100, 15, 95);
    let result = compress_into_range(&DynamicImage::ImageRgba8(rgba), &cfg).unwrap();

    let decoded = image::load_from_memory(&result.payload).unwrap().to_rgb8();
    let [r, g, b] = decoded.get_pixel(16, 16).0;
    assert!(r > 245 && g > 245 && b > 245, "expected white, got {r},{g},{b}");
}

#[test]
fn test_zero_size_input_is_decode_failure() {
    let cfg = config(16, 2.0, 1, 100, 15, 95);
    let err = compress_into_range(&DynamicImage::new_rgb8(0, 0), &cfg).unwrap_err();
    assert!(matches!(err, JpegTargetError::DecodeFailure(_)));
}
