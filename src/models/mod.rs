mod backend;
mod launch;
mod settings;

pub(crate) use backend::{Backend, BackendChoice};
pub(crate) use launch::{LaunchConfig, Timings};
pub(crate) use settings::LauncherSettings;
