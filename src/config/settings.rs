use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::compression::SpeedPreset;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub speed_preset: SpeedPreset,
    pub min_side_px: u32,
    pub scale_min: f64,
    pub upscale_max: f64,
    pub sharpen_on_resize: bool,
    pub sharpen_amount: f32,
    /// Upper size bound in KB (1 KB = 1024 bytes).
    pub target_kb: u64,
    /// Lower size bound in KB.
    pub min_kb: u64,
    pub quality_min: u8,
    pub quality_max: u8,
    pub threads: usize,
    pub master_name: String,
    pub store_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            speed_preset: SpeedPreset::Fast,
            min_side_px: 256,
            scale_min: 0.35,
            upscale_max: 2.0,
            sharpen_on_resize: true,
            sharpen_amount: 1.0,
            target_kb: 174,
            min_kb: 168,
            quality_min: 15,
            quality_max: 95,
            threads: 4,
            master_name: "compressed.zip".to_string(),
            store_dir: None,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::JpegTargetError::config(format!("Failed to parse settings YAML: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Apply `SPEED_PRESET` / `THREADS` environment overrides.
    ///
    /// Values are passed in rather than read here so callers (and tests) control
    /// the source. Unparseable values are rejected rather than ignored.
    pub fn apply_env_overrides(
        &mut self,
        speed_preset: Option<&str>,
        threads: Option<&str>,
    ) -> crate::error::Result<()> {
        if let Some(v) = speed_preset.filter(|v| !v.is_empty()) {
            self.speed_preset = v.parse()?;
        }
        if let Some(v) = threads.filter(|v| !v.is_empty()) {
            self.threads = v.trim().parse().map_err(|_| {
                crate::error::JpegTargetError::config(format!("Invalid THREADS value: '{v}'"))
            })?;
        }
        Ok(())
    }
}
