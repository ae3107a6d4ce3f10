use serde::{Deserialize, Serialize};

use super::BackendChoice;

/// Launcher preferences persisted next to the user's config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct LauncherSettings {
    /// Used when `--gui` is not given.
    pub(crate) default_gui: Option<BackendChoice>,
    pub(crate) splash_min_ms: u64,
    pub(crate) preload_timeout_ms: u64,
    pub(crate) log_capacity: usize,
    pub(crate) splash_auto_close_ms: u64,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            default_gui: None,
            splash_min_ms: 1500,
            preload_timeout_ms: 30_000,
            log_capacity: crate::logsink::DEFAULT_CAPACITY,
            splash_auto_close_ms: 10_000,
        }
    }
}
