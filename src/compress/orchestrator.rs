// Range targeting: drive geometry + quality search until the JPEG size lands
// inside [lower, upper].
//
// Regimes:
//   Original  - scale 1.0 fits under the upper bound; returned as-is
//   Shrinking - biased binary search over scale in [min_downscale, 1.0]
//   Growing   - shrunk result is under the lower bound, upscale toward max_upscale
//   Fallback  - nothing fit; min_downscale at q_min, returned regardless of size

use image::{DynamicImage, RgbImage};
use tracing::debug;

use super::geometry::{ensure_min_side, flatten_onto_white, resize_to_scale};
use super::jpeg::encode_rgb_to_jpeg;
use super::quality::{QualityFit, search_quality};
use crate::config::compression::CompressionConfig;
use crate::error::JpegTargetError;

/// Fraction of the remaining interval the shrink search moves past its midpoint.
const SHRINK_BIAS: f64 = 0.35;
/// Shrink search stops once the scale interval is narrower than this.
const SCALE_EPSILON: f64 = 1e-3;
const GROW_FACTOR: f64 = 1.2;
/// Applied to the trial scale when no quality fits after growing.
const GROW_BACKOFF: f64 = 0.95;

/// Which regime produced a [`CompressionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Original,
    Shrunk,
    Grown,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub payload: Vec<u8>,
    /// Scale relative to the source raster (1.0 = original size).
    pub scale: f64,
    pub quality: u8,
    pub stage: Stage,
}

impl CompressionResult {
    pub fn byte_len(&self) -> usize {
        self.payload.len()
    }
}

enum State {
    Original,
    Shrinking,
    Growing(CompressionResult),
    Fallback,
    Done(CompressionResult),
}

/// Compress `source` into a JPEG sized within the configured byte range.
///
/// Never fails on range grounds: when no scale fits the upper bound, the
/// fallback encoding at `min_downscale` / `q_min` is returned as-is.
pub fn compress_into_range(
    source: &DynamicImage,
    config: &CompressionConfig,
) -> crate::error::Result<CompressionResult> {
    if source.width() == 0 || source.height() == 0 {
        return Err(JpegTargetError::decode(format!(
            "empty raster ({}x{})",
            source.width(),
            source.height()
        )));
    }

    let search = RangeSearch {
        base: flatten_onto_white(source),
        config,
    };

    let mut state = State::Original;
    loop {
        state = match state {
            State::Original => search.original()?,
            State::Shrinking => search.shrink()?,
            State::Growing(best) => State::Done(search.grow(best)?),
            State::Fallback => State::Done(search.fallback()?),
            State::Done(result) => {
                debug!(
                    bytes = result.byte_len(),
                    scale = result.scale,
                    quality = result.quality,
                    stage = ?result.stage,
                    "range search done"
                );
                return Ok(result);
            }
        };
    }
}

struct RangeSearch<'a> {
    base: RgbImage,
    config: &'a CompressionConfig,
}

impl RangeSearch<'_> {
    /// Resize the flattened source to `scale`, then re-apply the min-side floor.
    fn candidate(&self, scale: f64) -> RgbImage {
        let sharpen = self.config.sharpen_on_resize();
        let amount = self.config.sharpen_amount();
        let resized = resize_to_scale(&self.base, scale, sharpen, amount);
        ensure_min_side(resized, self.config.min_shortest_side_px(), sharpen, amount)
    }

    fn fit(&self, image: &RgbImage, q_min: u8) -> crate::error::Result<Option<QualityFit>> {
        search_quality(
            image,
            self.config.upper_bound_bytes(),
            q_min,
            self.config.quality_max(),
        )
    }

    /// Route a shrunk result: under the floor goes to Growing, otherwise Done.
    fn settle(&self, result: CompressionResult) -> State {
        if result.byte_len() < self.config.lower_bound_bytes() {
            State::Growing(result)
        } else {
            State::Done(result)
        }
    }

    fn original(&self) -> crate::error::Result<State> {
        match self.fit(&self.base, self.config.quality_min())? {
            Some(fit) => {
                debug!(bytes = fit.payload.len(), quality = fit.quality, "fits at scale 1.0");
                Ok(State::Done(CompressionResult {
                    payload: fit.payload,
                    scale: 1.0,
                    quality: fit.quality,
                    stage: Stage::Original,
                }))
            }
            None => Ok(State::Shrinking),
        }
    }

    fn shrink(&self) -> crate::error::Result<State> {
        let mut lo = self.config.min_downscale();
        let mut hi = 1.0_f64;
        let mut best: Option<CompressionResult> = None;

        for step in 0..self.config.shrink_steps() {
            let mid = (lo + hi) / 2.0;
            let candidate = self.candidate(mid);

            match self.fit(&candidate, self.config.quality_min())? {
                Some(fit) => {
                    debug!(step, scale = mid, bytes = fit.payload.len(), quality = fit.quality, "shrink fit");
                    best = Some(CompressionResult {
                        payload: fit.payload,
                        scale: mid,
                        quality: fit.quality,
                        stage: Stage::Shrunk,
                    });
                    lo = mid + (hi - mid) * SHRINK_BIAS;
                }
                None => {
                    debug!(step, scale = mid, "shrink miss");
                    hi = mid - (mid - lo) * SHRINK_BIAS;
                }
            }

            if hi - lo < SCALE_EPSILON {
                break;
            }
        }

        Ok(match best {
            Some(result) => self.settle(result),
            None => State::Fallback,
        })
    }

    fn grow(&self, mut best: CompressionResult) -> crate::error::Result<CompressionResult> {
        let lower = self.config.lower_bound_bytes();
        let max_upscale = self.config.max_upscale();
        let start_bytes = best.byte_len();
        debug!(bytes = start_bytes, lower, "below floor, growing");

        // Same geometry, quality floor raised to the current quality.
        let current = self.candidate(best.scale);
        let floor = best.quality.max(self.config.quality_min());
        if let Some(fit) = self.fit(&current, floor)?
            && fit.payload.len() > best.byte_len()
        {
            best.payload = fit.payload;
            best.quality = fit.quality;
            best.stage = Stage::Grown;
        }

        let mut scale = best.scale;
        let mut iterations = 0;
        while best.byte_len() < lower && scale < max_upscale && iterations < self.config.grow_steps()
        {
            iterations += 1;
            scale = (scale * GROW_FACTOR).min(max_upscale);
            let candidate = self.candidate(scale);

            let Some(fit) = self.fit(&candidate, self.config.quality_min())? else {
                debug!(scale, "no quality fits after growing, backing off");
                scale *= GROW_BACKOFF;
                continue;
            };

            debug!(scale, bytes = fit.payload.len(), quality = fit.quality, "grow trial");
            if fit.payload.len() > best.byte_len() {
                best = CompressionResult {
                    payload: fit.payload,
                    scale,
                    quality: fit.quality,
                    stage: Stage::Grown,
                };
            }
        }

        debug_assert!(best.byte_len() >= start_bytes);
        Ok(best)
    }

    fn fallback(&self) -> crate::error::Result<CompressionResult> {
        let scale = self.config.min_downscale();
        let quality = self.config.quality_min();
        let candidate = self.candidate(scale);
        let payload = encode_rgb_to_jpeg(&candidate, quality)?;
        debug!(scale, quality, bytes = payload.len(), "fallback encoding");

        Ok(CompressionResult {
            payload,
            scale,
            quality,
            stage: Stage::Fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    use crate::config::compression::SpeedPreset;

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

    #[test]
    fn test_grow_keeps_largest_trial() {
        let img = noise_image(64, 64, 14);
        // Lower bound is unreachable, so every upscale step runs.
        let config =
            CompressionConfig::new(SpeedPreset::Fast, 1, 0.35, 2.0, false, 0.0, 5_000, 10_000)
                .unwrap()
                .with_quality_range(90, 95)
                .unwrap();
        let upper = config.upper_bound_bytes();
        let search = RangeSearch {
            base: img.clone(),
            config: &config,
        };

        let size_at = |image: &RgbImage, q_min: u8| {
            search_quality(image, upper, q_min, 95)
                .unwrap()
                .map(|fit| fit.payload.len())
                .unwrap_or(0)
        };

        let seed_fit = search_quality(&img, upper, 90, 95).unwrap().unwrap();
        let start = seed_fit.payload.len();
        let seed = CompressionResult {
            payload: seed_fit.payload,
            scale: 1.0,
            quality: seed_fit.quality,
            stage: Stage::Shrunk,
        };

        let mut expected = start.max(size_at(&search.candidate(1.0), seed_fit.quality.max(90)));
        let mut scale = 1.0_f64;
        while scale < 2.0 {
            scale = (scale * GROW_FACTOR).min(2.0);
            expected = expected.max(size_at(&search.candidate(scale), 90));
        }

        let result = search.grow(seed).unwrap();
        assert!(result.byte_len() >= start, "growing never loses bytes");
        assert_eq!(result.byte_len(), expected);
        assert!(result.scale >= 1.0 && result.scale <= 2.0);
        assert!(result.byte_len() <= upper);
        if result.byte_len() > start {
            assert_eq!(result.stage, Stage::Grown);
        }
    }
}
