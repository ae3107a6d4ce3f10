use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "Smore", "Smore")
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))
}

pub(crate) fn data_dir() -> Result<PathBuf> {
    let proj = project_dirs()?;
    let dir = proj.data_local_dir();
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir.to_path_buf())
}

pub(crate) fn cache_dir() -> Result<PathBuf> {
    let proj = project_dirs()?;
    let dir = proj.cache_dir();
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir.to_path_buf())
}

/// Append-only diagnostic log shared by every run.
pub(crate) fn log_file_path() -> Result<PathBuf> {
    let dir = data_dir()?.join("logs");
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir.join("smore.log"))
}

pub(crate) fn settings_path() -> Result<PathBuf> {
    let proj = project_dirs()?;
    Ok(proj.config_dir().join("launcher.json"))
}
