use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Capabilities the application cannot run without. Failure aborts the launch.
pub(crate) trait DependencyCheck {
    fn check(&self) -> Result<()>;
}

/// The application data directory must exist and accept writes: the search engine
/// keeps its progress and results there.
#[derive(Debug, Clone, Default)]
pub(crate) struct RequiredDependencies {
    data_dir: Option<PathBuf>,
}

impl RequiredDependencies {
    #[cfg(test)]
    pub(crate) fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
        }
    }
}

impl DependencyCheck for RequiredDependencies {
    fn check(&self) -> Result<()> {
        let dir = match &self.data_dir {
            Some(dir) => {
                fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
                dir.clone()
            }
            None => crate::storage::data_dir().context("resolve application data directory")?,
        };

        let marker = dir.join(".write-test");
        fs::write(&marker, b"ok")
            .with_context(|| format!("data directory {} is not writable", dir.display()))?;
        let _ = fs::remove_file(&marker);
        Ok(())
    }
}
