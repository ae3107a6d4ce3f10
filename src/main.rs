mod app;
mod cli;
mod launcher;
mod logfile;
mod logsink;
mod models;
mod preload;
mod probe;
mod select;
mod splash;
mod storage;

use std::process::ExitCode;

use clap::Parser;

use crate::launcher::{AppLauncher, Outcome, Services};
use crate::logsink::LogSink;
use crate::models::{LauncherSettings, Timings};

fn main() -> ExitCode {
    let args = cli::Args::parse();

    let log_path = match storage::log_file_path() {
        Ok(path) => Some(path),
        Err(e) => {
            eprintln!("log file unavailable: {e:#}");
            None
        }
    };
    if let Err(e) = logfile::init_tracing(log_path.as_deref()) {
        eprintln!("logging disabled: {e:#}");
    }

    let settings = storage::load_settings().unwrap_or_else(|e| {
        tracing::warn!("launcher settings ignored: {e:#}");
        LauncherSettings::default()
    });
    let config = args.launch_config(&settings);
    let timings = Timings::from(&settings);

    let sink = LogSink::with_capacity(settings.log_capacity);
    sink.debug(
        "main",
        format!(
            "gui={:?} cores={} splash={}",
            config.backend, config.core_count, config.show_splash
        ),
    );

    let mut launcher = AppLauncher::new(Services::system(timings), sink, timings);
    let outcome = launcher.launch(&config);
    if let Outcome::Finished { backend } = &outcome {
        tracing::info!(%backend, "shutting down");
    }
    outcome.exit_code()
}
