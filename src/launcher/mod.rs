//! Startup state machine.
//!
//! `INIT -> SELECT_BACKEND -> PRELOAD_STARTED -> SPLASH_SHOWN | SPLASH_SKIPPED
//! -> BUILD_APP -> RUNNING | FAILED`, with at most one retry of `BUILD_APP` on
//! the alternate backend.

mod state;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::anyhow;
use tokio::runtime::Runtime;

use crate::app::{AppContext, AppFactory, NativeFactory, RunError};
use crate::logsink::{LogRecord, LogSink, Severity};
use crate::models::{Backend, LaunchConfig, Timings};
use crate::preload::{
    DependencyCheck, HardwareProbe, Preloader, RequiredDependencies, SystemHardwareProbe,
};
use crate::probe::{CapabilityProbe, SystemProbe};
use crate::select::select;
use crate::splash::{HelperSplash, SplashCoordinator, SplashOutcome, SplashScreen};

pub(crate) use state::{LaunchError, LaunchState, Outcome};

const SOURCE: &str = "launcher";

/// Collaborators the launcher drives.
pub(crate) struct Services {
    pub(crate) dependencies: Box<dyn DependencyCheck>,
    pub(crate) capabilities: Box<dyn CapabilityProbe>,
    pub(crate) hardware: Arc<dyn HardwareProbe>,
    pub(crate) splash: Box<dyn SplashScreen>,
    pub(crate) apps: Box<dyn AppFactory>,
}

impl Services {
    pub(crate) fn system(timings: Timings) -> Self {
        Self {
            dependencies: Box::new(RequiredDependencies::default()),
            capabilities: Box::new(SystemProbe::from_env()),
            hardware: Arc::new(SystemHardwareProbe),
            splash: Box::new(HelperSplash::new(timings.splash_auto_close)),
            apps: Box::new(NativeFactory),
        }
    }
}

/// Shuts the runtime down without waiting for a stuck preload thread.
struct BackgroundRuntime(Option<Runtime>);

impl Drop for BackgroundRuntime {
    fn drop(&mut self) {
        if let Some(rt) = self.0.take() {
            rt.shutdown_background();
        }
    }
}

pub(crate) struct AppLauncher {
    services: Services,
    sink: LogSink,
    timings: Timings,
    states: Vec<LaunchState>,
}

impl AppLauncher {
    pub(crate) fn new(services: Services, sink: LogSink, timings: Timings) -> Self {
        Self {
            services,
            sink,
            timings,
            states: Vec::new(),
        }
    }

    /// States entered so far, in order.
    #[cfg(test)]
    pub(crate) fn states(&self) -> &[LaunchState] {
        &self.states
    }

    pub(crate) fn launch(&mut self, config: &LaunchConfig) -> Outcome {
        match self.try_launch(config) {
            Ok(backend) => {
                self.sink.info(SOURCE, format!("{backend} interface closed"));
                Outcome::Finished { backend }
            }
            Err(e) => {
                self.enter(LaunchState::Failed);
                self.sink.error(SOURCE, format!("{e}"));
                eprintln!("\nERROR: {e}");
                eprintln!("Please check the log file for details.");
                Outcome::Failed(e)
            }
        }
    }

    fn enter(&mut self, state: LaunchState) {
        tracing::debug!(source = SOURCE, %state, "state transition");
        self.states.push(state);
    }

    fn try_launch(&mut self, config: &LaunchConfig) -> Result<Backend, LaunchError> {
        self.enter(LaunchState::Init);
        self.services
            .dependencies
            .check()
            .map_err(LaunchError::MissingDependency)?;

        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("smore-preload")
            .enable_all()
            .build()
            .map_err(LaunchError::Runtime)?;
        let handle = rt.handle().clone();
        let rt = BackgroundRuntime(Some(rt));

        self.enter(LaunchState::SelectBackend);
        let backend = select(config, self.services.capabilities.as_ref());
        if config.backend.explicit().is_some() {
            self.sink.info(SOURCE, format!("Using requested {backend} GUI backend"));
        } else {
            self.sink.info(SOURCE, format!("Auto-selected {backend} GUI backend"));
        }

        let preloader = Preloader::new(Arc::clone(&self.services.hardware), self.sink.clone());
        let mut preload = preloader.start(&handle);
        self.enter(LaunchState::PreloadStarted);

        if config.show_splash {
            let coordinator = SplashCoordinator::new(self.timings, self.sink.clone());
            match coordinator.run(self.services.splash.as_mut(), &mut preload) {
                SplashOutcome::Shown { displayed } => {
                    let ms = displayed.as_millis() as u64;
                    tracing::debug!(source = SOURCE, ms, "splash done");
                    self.enter(LaunchState::SplashShown);
                }
                SplashOutcome::Skipped => self.enter(LaunchState::SplashSkipped),
            }
        } else {
            self.enter(LaunchState::SplashSkipped);
        }

        if !preload.is_finished() {
            self.sink.debug(SOURCE, "Waiting for pre-loading to finish...");
        }
        let result = preload.await_completion(self.timings.preload_timeout).clone();
        drop(preload);
        drop(rt);
        self.sink.debug(
            SOURCE,
            format!("Pre-loading settled after {} ms", result.elapsed.as_millis()),
        );

        let context = AppContext {
            backend,
            worker_threads: config.resolved_cores(),
            hardware: result.hardware,
            preload_error: result.error,
        };
        self.build_and_run(context)
    }

    /// BUILD_APP for the selected backend, then once for its alternate.
    fn build_and_run(&mut self, context: AppContext) -> Result<Backend, LaunchError> {
        let first = context.backend;
        let attempts = [first, first.alternate()];
        let mut handed_back: Option<Vec<LogRecord>> = None;
        let mut last_error = None;

        for (i, backend) in attempts.into_iter().enumerate() {
            self.enter(LaunchState::BuildApp(backend));
            if i > 0 {
                let message = format!("Falling back to {backend} interface");
                self.note(&mut handed_back, Severity::Info, message);
            }

            let ctx = AppContext {
                backend,
                ..context.clone()
            };
            let mut app = match self.services.apps.build(backend, ctx) {
                Ok(app) => app,
                Err(e) => {
                    self.sink
                        .error(SOURCE, format!("Failed to load {backend} interface: {e:#}"));
                    last_error = Some(e);
                    continue;
                }
            };

            let records = match handed_back.take() {
                Some(records) => records,
                None => {
                    let evicted = self.sink.evicted();
                    if evicted > 0 {
                        self.sink.warn(
                            SOURCE,
                            format!("{evicted} early log records were dropped (buffer full)"),
                        );
                    }
                    self.sink.drain()
                }
            };
            app.replay(records);
            self.enter(LaunchState::Running(app.backend()));

            match app.run_loop() {
                Ok(()) => return Ok(backend),
                Err(RunError::Startup { error, records, .. }) => {
                    handed_back = Some(records);
                    let message = format!("{backend} interface failed to start: {error:#}");
                    self.note(&mut handed_back, Severity::Error, message);
                    last_error = Some(error);
                }
                Err(e @ RunError::Crashed { .. }) => return Err(LaunchError::Crashed(e)),
            }
        }

        Err(LaunchError::NoBackend {
            attempted: attempts.to_vec(),
            last: last_error.unwrap_or_else(|| anyhow!("no backend was attempted")),
        })
    }

    /// Logs a record that the next UI must also see. Once the sink is sealed,
    /// that UI only gets the records handed back by the previous one.
    fn note(
        &self,
        handed_back: &mut Option<Vec<LogRecord>>,
        severity: Severity,
        message: String,
    ) {
        self.sink.log(SOURCE, severity, message.clone());
        if let Some(records) = handed_back {
            records.push(LogRecord::new(SOURCE, severity, message));
        }
    }
}
