pub mod compression;
pub mod settings;

use settings::Settings;
use std::path::Path;

/// Load settings for a batch run.
///
/// An explicit path must exist. Without one, `settings.yaml` in `cwd` is used
/// when present, otherwise the built-in defaults.
pub fn load_settings(explicit: Option<&Path>, cwd: &Path) -> crate::error::Result<Settings> {
    if let Some(path) = explicit {
        return Settings::from_file(path);
    }

    let settings_path = cwd.join("settings.yaml");

    if settings_path.exists() {
        Settings::from_file(&settings_path)
    } else {
        Ok(Settings::default())
    }
}
