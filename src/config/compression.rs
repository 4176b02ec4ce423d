// Validated, immutable compression parameters shared by every job in a batch.

use std::str::FromStr;

use serde::Deserialize;

use super::settings::Settings;
use crate::error::JpegTargetError;

/// Resource/iteration-budget tradeoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedPreset {
    Fast,
    Balanced,
}

impl SpeedPreset {
    pub fn as_str(self) -> &'static str {
        match self {
            SpeedPreset::Fast => "fast",
            SpeedPreset::Balanced => "balanced",
        }
    }
}

impl FromStr for SpeedPreset {
    type Err = JpegTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(SpeedPreset::Fast),
            "balanced" => Ok(SpeedPreset::Balanced),
            other => Err(JpegTargetError::config(format!(
                "Unknown speed preset: '{other}' (expected 'fast' or 'balanced')"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompressionConfig {
    speed_preset: SpeedPreset,
    min_shortest_side_px: u32,
    min_downscale: f64,
    max_upscale: f64,
    sharpen_on_resize: bool,
    sharpen_amount: f32,
    target_upper_kb: u64,
    target_lower_kb: u64,
    quality_min: u8,
    quality_max: u8,
}

impl CompressionConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        speed_preset: SpeedPreset,
        min_shortest_side_px: u32,
        min_downscale: f64,
        max_upscale: f64,
        sharpen_on_resize: bool,
        sharpen_amount: f32,
        target_lower_kb: u64,
        target_upper_kb: u64,
    ) -> crate::error::Result<Self> {
        Self {
            speed_preset,
            min_shortest_side_px,
            min_downscale,
            max_upscale,
            sharpen_on_resize,
            sharpen_amount,
            target_upper_kb,
            target_lower_kb,
            quality_min: 15,
            quality_max: 95,
        }
        .validated()
    }

    /// Replace the encoder quality window (defaults to 15..=95).
    pub fn with_quality_range(mut self, quality_min: u8, quality_max: u8) -> crate::error::Result<Self> {
        self.quality_min = quality_min;
        self.quality_max = quality_max;
        self.validated()
    }

    fn validated(self) -> crate::error::Result<Self> {
        if self.min_shortest_side_px < 1 {
            return Err(JpegTargetError::config("min_side_px must be >= 1"));
        }
        if !(self.min_downscale > 0.0 && self.min_downscale <= 1.0) {
            return Err(JpegTargetError::config(format!(
                "scale_min must be in (0, 1], got {}",
                self.min_downscale
            )));
        }
        if !(self.max_upscale >= 1.0 && self.max_upscale.is_finite()) {
            return Err(JpegTargetError::config(format!(
                "upscale_max must be >= 1, got {}",
                self.max_upscale
            )));
        }
        if !(self.sharpen_amount >= 0.0 && self.sharpen_amount.is_finite()) {
            return Err(JpegTargetError::config(format!(
                "sharpen_amount must be >= 0, got {}",
                self.sharpen_amount
            )));
        }
        if self.target_lower_kb == 0 || self.target_lower_kb > self.target_upper_kb {
            return Err(JpegTargetError::config(format!(
                "target range must satisfy 0 < min_kb <= target_kb, got {}..{}",
                self.target_lower_kb, self.target_upper_kb
            )));
        }
        if self.quality_min == 0 || self.quality_min > self.quality_max || self.quality_max > 100 {
            return Err(JpegTargetError::config(format!(
                "quality range must satisfy 1 <= quality_min <= quality_max <= 100, got {}..{}",
                self.quality_min, self.quality_max
            )));
        }
        Ok(self)
    }

    pub fn speed_preset(&self) -> SpeedPreset {
        self.speed_preset
    }

    pub fn min_shortest_side_px(&self) -> u32 {
        self.min_shortest_side_px
    }

    pub fn min_downscale(&self) -> f64 {
        self.min_downscale
    }

    pub fn max_upscale(&self) -> f64 {
        self.max_upscale
    }

    pub fn sharpen_on_resize(&self) -> bool {
        self.sharpen_on_resize
    }

    pub fn sharpen_amount(&self) -> f32 {
        self.sharpen_amount
    }

    pub fn quality_min(&self) -> u8 {
        self.quality_min
    }

    pub fn quality_max(&self) -> u8 {
        self.quality_max
    }

    pub fn upper_bound_bytes(&self) -> usize {
        (self.target_upper_kb * 1024) as usize
    }

    pub fn lower_bound_bytes(&self) -> usize {
        (self.target_lower_kb * 1024) as usize
    }

    /// PDF render density in DPI.
    pub fn render_dpi(&self) -> u32 {
        match self.speed_preset {
            SpeedPreset::Fast => 150,
            SpeedPreset::Balanced => 200,
        }
    }

    /// Iteration budget for the downscale search.
    pub fn shrink_steps(&self) -> usize {
        match self.speed_preset {
            SpeedPreset::Fast => 8,
            SpeedPreset::Balanced => 12,
        }
    }

    /// Iteration budget for the upscale loop.
    pub fn grow_steps(&self) -> usize {
        match self.speed_preset {
            SpeedPreset::Fast => 6,
            SpeedPreset::Balanced => 12,
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        CompressionConfig {
            speed_preset: SpeedPreset::Fast,
            min_shortest_side_px: 256,
            min_downscale: 0.35,
            max_upscale: 2.0,
            sharpen_on_resize: true,
            sharpen_amount: 1.0,
            target_upper_kb: 174,
            target_lower_kb: 168,
            quality_min: 15,
            quality_max: 95,
        }
    }
}

impl TryFrom<&Settings> for CompressionConfig {
    type Error = JpegTargetError;

    fn try_from(settings: &Settings) -> Result<Self, Self::Error> {
        CompressionConfig::new(
            settings.speed_preset,
            settings.min_side_px,
            settings.scale_min,
            settings.upscale_max,
            settings.sharpen_on_resize,
            settings.sharpen_amount,
            settings.min_kb,
            settings.target_kb,
        )?
        .with_quality_range(settings.quality_min, settings.quality_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_budgets() {
        let fast = CompressionConfig::default();
        assert_eq!(fast.render_dpi(), 150);
        assert_eq!(fast.shrink_steps(), 8);
        assert_eq!(fast.grow_steps(), 6);

        let balanced =
            CompressionConfig::new(SpeedPreset::Balanced, 256, 0.35, 2.0, true, 1.0, 168, 174)
                .expect("valid config");
        assert_eq!(balanced.render_dpi(), 200);
        assert_eq!(balanced.shrink_steps(), 12);
        assert_eq!(balanced.grow_steps(), 12);
    }

    #[test]
    fn test_bounds_in_bytes() {
        let config = CompressionConfig::default();
        assert_eq!(config.upper_bound_bytes(), 174 * 1024);
        assert_eq!(config.lower_bound_bytes(), 168 * 1024);
    }

    #[test]
    fn test_speed_preset_parse() {
        assert_eq!("Balanced".parse::<SpeedPreset>().unwrap(), SpeedPreset::Balanced);
        assert!("turbo".parse::<SpeedPreset>().is_err());
    }
}
