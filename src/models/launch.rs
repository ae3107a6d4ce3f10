use std::time::Duration;

use super::{BackendChoice, LauncherSettings};

/// Parsed once from the command line; read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LaunchConfig {
    pub(crate) backend: BackendChoice,
    /// Worker cores for the search engine; 0 means detect.
    pub(crate) core_count: usize,
    pub(crate) show_splash: bool,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            backend: BackendChoice::Auto,
            core_count: 0,
            show_splash: true,
        }
    }
}

impl LaunchConfig {
    pub(crate) fn resolved_cores(&self) -> usize {
        if self.core_count > 0 {
            return self.core_count;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Waits the launcher is allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Timings {
    pub(crate) splash_min: Duration,
    pub(crate) preload_timeout: Duration,
    pub(crate) splash_auto_close: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self::from(&LauncherSettings::default())
    }
}

impl From<&LauncherSettings> for Timings {
    fn from(s: &LauncherSettings) -> Self {
        Self {
            splash_min: Duration::from_millis(s.splash_min_ms),
            preload_timeout: Duration::from_millis(s.preload_timeout_ms),
            splash_auto_close: Duration::from_millis(s.splash_auto_close_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_core_count_is_kept() {
        let cfg = LaunchConfig {
            core_count: 3,
            ..LaunchConfig::default()
        };
        assert_eq!(cfg.resolved_cores(), 3);
    }

    #[test]
    fn zero_cores_detects_at_least_one() {
        assert!(LaunchConfig::default().resolved_cores() >= 1);
    }
}
