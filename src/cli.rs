use clap::Parser;

use crate::models::{BackendChoice, LaunchConfig, LauncherSettings};

#[derive(Parser, Debug)]
#[command(
    name = "smore-desktop",
    version,
    about = "Smore - Bitcoin wallet brute-force tool (launcher)"
)]
pub(crate) struct Args {
    /// GUI backend: webview (primary), egui (secondary) or auto.
    #[arg(long, value_enum)]
    pub(crate) gui: Option<BackendChoice>,
    /// Number of CPU cores to use (0 for auto-detect).
    #[arg(long, default_value_t = 0)]
    pub(crate) cores: usize,
    /// Skip the splash screen.
    #[arg(long)]
    pub(crate) no_splash: bool,
}

impl Args {
    /// `--gui` wins over the settings file, which wins over `auto`.
    pub(crate) fn launch_config(&self, settings: &LauncherSettings) -> LaunchConfig {
        LaunchConfig {
            backend: self.gui.or(settings.default_gui).unwrap_or_default(),
            core_count: self.cores,
            show_splash: !self.no_splash,
        }
    }
}
