use std::{fs, path::Path};

use anyhow::{Context, Result};

use crate::models::LauncherSettings;

use super::settings_path;

/// Reads the launcher settings; a missing file yields defaults.
pub(crate) fn load_settings() -> Result<LauncherSettings> {
    let path = settings_path()?;
    load_settings_from(&path)
}

pub(crate) fn load_settings_from(path: &Path) -> Result<LauncherSettings> {
    if !path.exists() {
        return Ok(LauncherSettings::default());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let st = serde_json::from_str::<LauncherSettings>(&raw)
        .with_context(|| format!("parse {}", path.display()))?;
    Ok(st)
}
