//! Background initialization that must never take the launcher down with it.
//!
//! [`Preloader::preload`] converts every failure (including panics) into a
//! [`PreloadResult`]. [`Preloader::start`] runs it on a tokio blocking thread and
//! returns a [`PreloadHandle`] the launcher waits on with a deadline.

mod deps;
mod hardware;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::logsink::LogSink;

pub(crate) use deps::{DependencyCheck, RequiredDependencies};
pub(crate) use hardware::{HardwareInfo, HardwareProbe, SystemHardwareProbe};

const SOURCE: &str = "preload";

/// Outcome of one preload run. Produced once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PreloadResult {
    pub(crate) success: bool,
    pub(crate) hardware: Option<HardwareInfo>,
    pub(crate) error: Option<String>,
    pub(crate) elapsed: Duration,
}

impl PreloadResult {
    fn ok(hardware: Option<HardwareInfo>, elapsed: Duration) -> Self {
        Self {
            success: true,
            hardware,
            error: None,
            elapsed,
        }
    }

    fn failed(error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            hardware: None,
            error: Some(error.into()),
            elapsed,
        }
    }
}

pub(crate) struct Preloader {
    hardware: Arc<dyn HardwareProbe>,
    sink: LogSink,
    cancelled: Arc<AtomicBool>,
}

impl Preloader {
    pub(crate) fn new(hardware: Arc<dyn HardwareProbe>, sink: LogSink) -> Self {
        Self {
            hardware,
            sink,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs the hardware probe on the current thread. Never panics.
    pub(crate) fn preload(&self) -> PreloadResult {
        let started = Instant::now();
        self.sink.info(SOURCE, "Pre-loading dependencies...");

        if self.cancelled.load(Ordering::Acquire) {
            return PreloadResult::failed(
                "preload cancelled before hardware detection",
                started.elapsed(),
            );
        }

        let probe = Arc::clone(&self.hardware);
        match panic::catch_unwind(AssertUnwindSafe(move || probe.probe())) {
            Ok(Ok(Some(info))) => {
                let message = match info.get("gpu").filter(|gpu| gpu.as_str() != "none") {
                    Some(gpu) => format!("Pre-initialization: GPU detected: {gpu}"),
                    None => "Pre-initialization: No GPU detected, using CPU mode".to_string(),
                };
                self.sink.info(SOURCE, message);
                PreloadResult::ok(Some(info), started.elapsed())
            }
            Ok(Ok(None)) => {
                self.sink.info(
                    SOURCE,
                    "Pre-initialization: No hardware information, using CPU mode",
                );
                PreloadResult::ok(None, started.elapsed())
            }
            Ok(Err(e)) => {
                let error = format!("{e:#}");
                self.sink.warn(SOURCE, format!("Error during GPU detection: {error}"));
                PreloadResult::failed(error, started.elapsed())
            }
            Err(payload) => {
                let error = format!("hardware probe panicked: {}", panic_message(&*payload));
                self.sink.warn(SOURCE, error.clone());
                PreloadResult::failed(error, started.elapsed())
            }
        }
    }

    /// Spawns [`Preloader::preload`] on the runtime's blocking pool.
    pub(crate) fn start(self, rt: &Handle) -> PreloadHandle {
        let cancelled = Arc::clone(&self.cancelled);
        let sink = self.sink.clone();
        let task = rt.spawn_blocking(move || self.preload());
        PreloadHandle {
            rt: rt.clone(),
            task: Some(task),
            result: None,
            cancelled,
            sink,
            started: Instant::now(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Structured handle on a running preload. Dropping it cancels the work.
pub(crate) struct PreloadHandle {
    rt: Handle,
    task: Option<JoinHandle<PreloadResult>>,
    result: Option<PreloadResult>,
    cancelled: Arc<AtomicBool>,
    sink: LogSink,
    started: Instant,
}

impl PreloadHandle {
    pub(crate) fn runtime(&self) -> &Handle {
        &self.rt
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.result.is_some() || self.task.as_ref().is_some_and(|t| t.is_finished())
    }

    /// Waits at most `timeout` for the result. A timed out preload is cancelled
    /// and reported as failed; later calls return the same result immediately.
    pub(crate) async fn wait(&mut self, timeout: Duration) -> &PreloadResult {
        let result = match self.result.take() {
            Some(result) => result,
            None => self.join(timeout).await,
        };
        self.result.insert(result)
    }

    /// Blocking form of [`PreloadHandle::wait`] for the launcher's main thread.
    pub(crate) fn await_completion(&mut self, timeout: Duration) -> &PreloadResult {
        let rt = self.rt.clone();
        rt.block_on(self.wait(timeout))
    }

    pub(crate) fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if self.result.is_none() {
            self.result = Some(PreloadResult::failed("preload cancelled", self.started.elapsed()));
        }
    }

    async fn join(&mut self, timeout: Duration) -> PreloadResult {
        let Some(mut task) = self.task.take() else {
            return PreloadResult::failed("preload cancelled", self.started.elapsed());
        };
        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                let error = format!("preload worker failed: {e}");
                self.sink.warn(SOURCE, error.clone());
                PreloadResult::failed(error, self.started.elapsed())
            }
            Err(_) => {
                self.cancelled.store(true, Ordering::Release);
                task.abort();
                let error = format!("preload did not finish within {} ms", timeout.as_millis());
                self.sink
                    .warn(SOURCE, format!("{error}; continuing without hardware acceleration"));
                PreloadResult::failed(error, self.started.elapsed())
            }
        }
    }
}

impl Drop for PreloadHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
