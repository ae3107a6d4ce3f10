use std::fmt;
use std::process::ExitCode;

use crate::app::RunError;
use crate::models::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LaunchState {
    Init,
    SelectBackend,
    PreloadStarted,
    SplashShown,
    SplashSkipped,
    BuildApp(Backend),
    Running(Backend),
    Failed,
}

impl fmt::Display for LaunchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchState::Init => f.write_str("INIT"),
            LaunchState::SelectBackend => f.write_str("SELECT_BACKEND"),
            LaunchState::PreloadStarted => f.write_str("PRELOAD_STARTED"),
            LaunchState::SplashShown => f.write_str("SPLASH_SHOWN"),
            LaunchState::SplashSkipped => f.write_str("SPLASH_SKIPPED"),
            LaunchState::BuildApp(b) => write!(f, "BUILD_APP({b})"),
            LaunchState::Running(b) => write!(f, "RUNNING({b})"),
            LaunchState::Failed => f.write_str("FAILED"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum LaunchError {
    #[error("Failed to load dependencies: {0:#}")]
    MissingDependency(anyhow::Error),
    #[error("could not start the background runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("no GUI backend could be started (tried {}): {last:#}", join(.attempted))]
    NoBackend { attempted: Vec<Backend>, last: anyhow::Error },
    #[error(transparent)]
    Crashed(RunError),
}

fn join(backends: &[Backend]) -> String {
    backends.iter().map(|b| b.as_str()).collect::<Vec<_>>().join(", ")
}

/// How a launch ended.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// The run loop of `backend` returned normally.
    Finished { backend: Backend },
    Failed(LaunchError),
}

impl Outcome {
    pub(crate) fn code(&self) -> u8 {
        match self {
            Outcome::Finished { .. } => 0,
            Outcome::Failed(_) => 1,
        }
    }

    pub(crate) fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn no_backend_lists_every_attempt() {
        let err = LaunchError::NoBackend {
            attempted: vec![Backend::Egui, Backend::Webview],
            last: anyhow!("webkit missing"),
        };
        assert_eq!(
            err.to_string(),
            "no GUI backend could be started (tried egui, webview): webkit missing"
        );
    }

    #[test]
    fn exit_codes() {
        assert_eq!(Outcome::Finished { backend: Backend::Egui }.code(), 0);
        assert_eq!(Outcome::Failed(LaunchError::MissingDependency(anyhow!("x"))).code(), 1);
    }
}
