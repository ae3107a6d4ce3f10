use std::fmt;

use serde::{Deserialize, Serialize};

/// A GUI toolkit that can present the main window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Backend {
    /// tao window hosting the system webview (WebKitGTK / WebView2 / WKWebView).
    Webview,
    /// eframe/egui immediate-mode window; the lightweight fallback.
    Egui,
}

impl Backend {
    /// Probe order for `auto`, richest first.
    pub(crate) const PRIORITY: [Backend; 2] = [Backend::Webview, Backend::Egui];

    /// Used when no capability probe succeeds.
    pub(crate) const GUARANTEED: Backend = Backend::Egui;

    /// The backend tried once if this one cannot be built.
    pub(crate) fn alternate(self) -> Backend {
        match self {
            Backend::Webview => Backend::Egui,
            Backend::Egui => Backend::Webview,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Backend::Webview => "webview",
            Backend::Egui => "egui",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user asked for on the command line or in the settings file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum BackendChoice {
    #[default]
    Auto,
    #[value(alias = "primary")]
    #[serde(alias = "primary")]
    Webview,
    #[value(alias = "secondary")]
    #[serde(alias = "secondary")]
    Egui,
}

impl BackendChoice {
    pub(crate) fn explicit(self) -> Option<Backend> {
        match self {
            BackendChoice::Auto => None,
            BackendChoice::Webview => Some(Backend::Webview),
            BackendChoice::Egui => Some(Backend::Egui),
        }
    }
}
