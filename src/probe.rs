//! Read-only checks for whether a GUI backend's runtime is installed.

#[cfg(any(target_os = "linux", target_os = "windows"))]
use std::path::Path;

use crate::models::Backend;

pub(crate) const DISABLE_ENV: &str = "SMORE_DISABLE_BACKENDS";

pub(crate) trait CapabilityProbe {
    fn is_available(&self, backend: Backend) -> bool;
}

/// Probes the running system.
#[derive(Debug, Clone, Default)]
pub(crate) struct SystemProbe {
    disabled: Vec<Backend>,
}

impl SystemProbe {
    /// Reads `SMORE_DISABLE_BACKENDS` (comma separated backend names).
    pub(crate) fn from_env() -> Self {
        let disabled = std::env::var(DISABLE_ENV)
            .map(|v| parse_disabled(&v))
            .unwrap_or_default();
        Self { disabled }
    }
}

fn parse_disabled(raw: &str) -> Vec<Backend> {
    raw.split(',')
        .filter_map(|name| match name.trim().to_ascii_lowercase().as_str() {
            "webview" | "primary" => Some(Backend::Webview),
            "egui" | "secondary" => Some(Backend::Egui),
            _ => None,
        })
        .collect()
}

impl CapabilityProbe for SystemProbe {
    fn is_available(&self, backend: Backend) -> bool {
        if self.disabled.contains(&backend) {
            return false;
        }
        match backend {
            Backend::Webview => has_display() && has_webview_engine(),
            Backend::Egui => has_display(),
        }
    }
}

#[cfg(target_os = "linux")]
fn has_display() -> bool {
    ["DISPLAY", "WAYLAND_DISPLAY"]
        .iter()
        .any(|var| std::env::var_os(var).is_some_and(|v| !v.is_empty()))
}

#[cfg(not(target_os = "linux"))]
fn has_display() -> bool {
    true
}

#[cfg(target_os = "linux")]
fn has_webview_engine() -> bool {
    const LIB_DIRS: &[&str] = &[
        "/usr/lib",
        "/usr/lib64",
        "/usr/lib/x86_64-linux-gnu",
        "/usr/lib/aarch64-linux-gnu",
        "/usr/local/lib",
    ];
    const LIBS: &[&str] = &["libwebkit2gtk-4.1.so.0", "libwebkit2gtk-4.0.so.37"];

    LIB_DIRS
        .iter()
        .any(|dir| LIBS.iter().any(|lib| Path::new(dir).join(lib).exists()))
}

#[cfg(target_os = "windows")]
fn has_webview_engine() -> bool {
    ["ProgramFiles(x86)", "ProgramFiles"]
        .iter()
        .filter_map(std::env::var_os)
        .any(|root| {
            Path::new(&root)
                .join("Microsoft")
                .join("EdgeWebView")
                .join("Application")
                .is_dir()
        })
}

// WKWebView ships with the OS.
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn has_webview_engine() -> bool {
    true
}
