use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};

use super::*;
use crate::app::LiveApplication;
use crate::models::BackendChoice;
use crate::preload::HardwareInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    Runs,
    BuildFails,
    StartupFails,
    Crashes,
}

/// Shared counters the fakes report into.
#[derive(Default, Clone)]
struct Calls {
    capability_probes: Rc<Cell<usize>>,
    hardware_probes: Arc<AtomicUsize>,
    splash_shows: Rc<Cell<usize>>,
    builds: Rc<RefCell<Vec<Backend>>>,
    replayed: Rc<RefCell<Vec<(Backend, Vec<String>)>>>,
    contexts: Rc<RefCell<Vec<AppContext>>>,
}

struct Deps(bool);

impl DependencyCheck for Deps {
    fn check(&self) -> Result<()> {
        if self.0 {
            Ok(())
        } else {
            bail!("data directory is read-only")
        }
    }
}

struct Caps {
    webview: bool,
    egui: bool,
    calls: Rc<Cell<usize>>,
}

impl CapabilityProbe for Caps {
    fn is_available(&self, backend: Backend) -> bool {
        self.calls.set(self.calls.get() + 1);
        match backend {
            Backend::Webview => self.webview,
            Backend::Egui => self.egui,
        }
    }
}

struct Hardware {
    fails: bool,
    /// When set, the hardware probe spins until the flag is raised.
    release: Option<Arc<AtomicBool>>,
    calls: Arc<AtomicUsize>,
}

impl HardwareProbe for Hardware {
    fn probe(&self) -> Result<Option<HardwareInfo>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(release) = &self.release {
            while !release.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        if self.fails {
            bail!("GPU query crashed");
        }
        Ok(Some(HardwareInfo::from([("gpu".to_string(), "Intel".to_string())])))
    }
}

struct Splash {
    fails: bool,
    shows: Rc<Cell<usize>>,
}

impl SplashScreen for Splash {
    fn show(&mut self) -> Result<()> {
        if self.fails {
            bail!("splash.png not found");
        }
        self.shows.set(self.shows.get() + 1);
        Ok(())
    }

    fn close(&mut self) {}
}

struct Factory {
    webview: Behaviour,
    egui: Behaviour,
    calls: Calls,
}

impl AppFactory for Factory {
    fn build(&self, backend: Backend, context: AppContext) -> Result<Box<dyn LiveApplication>> {
        self.calls.builds.borrow_mut().push(backend);
        self.calls.contexts.borrow_mut().push(context);
        let behaviour = match backend {
            Backend::Webview => self.webview,
            Backend::Egui => self.egui,
        };
        if behaviour == Behaviour::BuildFails {
            bail!("{backend} toolkit not installed");
        }
        Ok(Box::new(FakeApp {
            backend,
            behaviour,
            records: Vec::new(),
            calls: self.calls.clone(),
        }))
    }
}

struct FakeApp {
    backend: Backend,
    behaviour: Behaviour,
    records: Vec<LogRecord>,
    calls: Calls,
}

impl LiveApplication for FakeApp {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn replay(&mut self, records: Vec<LogRecord>) {
        let messages = records.iter().map(|r| r.message.clone()).collect();
        self.calls.replayed.borrow_mut().push((self.backend, messages));
        self.records = records;
    }

    fn run_loop(self: Box<Self>) -> Result<(), RunError> {
        match self.behaviour {
            Behaviour::Runs => Ok(()),
            Behaviour::StartupFails => Err(RunError::Startup {
                backend: self.backend,
                error: anyhow!("no OpenGL context"),
                records: self.records,
            }),
            Behaviour::Crashes => Err(RunError::Crashed {
                backend: self.backend,
                error: anyhow!("renderer lost"),
            }),
            Behaviour::BuildFails => unreachable!("never built"),
        }
    }
}

struct Setup {
    deps_ok: bool,
    webview_present: bool,
    egui_present: bool,
    hardware_fails: bool,
    hardware_release: Option<Arc<AtomicBool>>,
    splash_fails: bool,
    preload_timeout: Duration,
    webview: Behaviour,
    egui: Behaviour,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            deps_ok: true,
            webview_present: true,
            egui_present: true,
            hardware_fails: false,
            hardware_release: None,
            splash_fails: false,
            preload_timeout: Duration::from_secs(5),
            webview: Behaviour::Runs,
            egui: Behaviour::Runs,
        }
    }
}

struct Run {
    outcome: Outcome,
    states: Vec<LaunchState>,
    calls: Calls,
    sink: LogSink,
}

fn launch(setup: Setup, config: LaunchConfig) -> Run {
    let calls = Calls::default();
    let services = Services {
        dependencies: Box::new(Deps(setup.deps_ok)),
        capabilities: Box::new(Caps {
            webview: setup.webview_present,
            egui: setup.egui_present,
            calls: calls.capability_probes.clone(),
        }),
        hardware: Arc::new(Hardware {
            fails: setup.hardware_fails,
            release: setup.hardware_release,
            calls: calls.hardware_probes.clone(),
        }),
        splash: Box::new(Splash {
            fails: setup.splash_fails,
            shows: calls.splash_shows.clone(),
        }),
        apps: Box::new(Factory {
            webview: setup.webview,
            egui: setup.egui,
            calls: calls.clone(),
        }),
    };
    let timings = Timings {
        splash_min: Duration::from_millis(5),
        preload_timeout: setup.preload_timeout,
        splash_auto_close: Duration::from_secs(1),
    };
    let sink = LogSink::with_capacity(100);
    let mut launcher = AppLauncher::new(services, sink.clone(), timings);
    let outcome = launcher.launch(&config);
    Run {
        outcome,
        states: launcher.states().to_vec(),
        calls,
        sink,
    }
}

fn config(backend: BackendChoice, show_splash: bool) -> LaunchConfig {
    LaunchConfig {
        backend,
        core_count: 4,
        show_splash,
    }
}

#[test]
fn auto_without_splash_runs_primary_backend() {
    let run = launch(Setup::default(), config(BackendChoice::Auto, false));

    assert_eq!(run.outcome.code(), 0);
    assert!(matches!(run.outcome, Outcome::Finished { backend: Backend::Webview }));
    assert_eq!(*run.calls.builds.borrow(), vec![Backend::Webview]);
    assert_eq!(run.calls.splash_shows.get(), 0);
    assert_eq!(
        run.states,
        vec![
            LaunchState::Init,
            LaunchState::SelectBackend,
            LaunchState::PreloadStarted,
            LaunchState::SplashSkipped,
            LaunchState::BuildApp(Backend::Webview),
            LaunchState::Running(Backend::Webview),
        ]
    );
}

#[test]
fn no_capabilities_and_failing_fallback_exits_with_one() {
    let setup = Setup {
        webview_present: false,
        egui_present: false,
        webview: Behaviour::BuildFails,
        egui: Behaviour::BuildFails,
        ..Setup::default()
    };
    let run = launch(setup, config(BackendChoice::Auto, true));

    assert_eq!(run.outcome.code(), 1);
    assert!(matches!(run.outcome, Outcome::Failed(LaunchError::NoBackend { .. })));
    assert_eq!(*run.calls.builds.borrow(), vec![Backend::Egui, Backend::Webview]);
    assert_eq!(run.states.last(), Some(&LaunchState::Failed));
    assert!(run.calls.replayed.borrow().is_empty());
}

#[test]
fn explicit_primary_falls_back_exactly_once() {
    let setup = Setup {
        webview: Behaviour::BuildFails,
        ..Setup::default()
    };
    let run = launch(setup, config(BackendChoice::Webview, false));

    assert_eq!(run.outcome.code(), 0);
    assert!(matches!(run.outcome, Outcome::Finished { backend: Backend::Egui }));
    assert_eq!(*run.calls.builds.borrow(), vec![Backend::Webview, Backend::Egui]);
    assert_eq!(run.calls.capability_probes.get(), 0);
    assert_eq!(
        &run.states[run.states.len() - 3..],
        &[
            LaunchState::BuildApp(Backend::Webview),
            LaunchState::BuildApp(Backend::Egui),
            LaunchState::Running(Backend::Egui),
        ]
    );
}

#[test]
fn missing_dependency_stops_before_selection_and_preload() {
    let setup = Setup {
        deps_ok: false,
        ..Setup::default()
    };
    let run = launch(setup, config(BackendChoice::Auto, true));

    assert_eq!(run.outcome.code(), 1);
    assert!(matches!(run.outcome, Outcome::Failed(LaunchError::MissingDependency(_))));
    assert_eq!(run.calls.capability_probes.get(), 0);
    assert_eq!(run.calls.hardware_probes.load(Ordering::SeqCst), 0);
    assert!(run.calls.builds.borrow().is_empty());
    assert_eq!(run.states, vec![LaunchState::Init, LaunchState::Failed]);
}

#[test]
fn splash_failure_still_reaches_build() {
    let setup = Setup {
        splash_fails: true,
        ..Setup::default()
    };
    let run = launch(setup, config(BackendChoice::Auto, true));

    assert_eq!(run.outcome.code(), 0);
    assert!(run.states.contains(&LaunchState::SplashSkipped));
    assert!(!run.states.contains(&LaunchState::SplashShown));
    assert_eq!(run.calls.hardware_probes.load(Ordering::SeqCst), 1);
    let contexts = run.calls.contexts.borrow();
    assert!(contexts[0].hardware.is_some());
}

#[test]
fn splash_is_shown_when_enabled() {
    let run = launch(Setup::default(), config(BackendChoice::Auto, true));
    assert_eq!(run.calls.splash_shows.get(), 1);
    assert!(run.states.contains(&LaunchState::SplashShown));
}

#[test]
fn buffered_records_reach_the_ui_in_order() {
    let run = launch(Setup::default(), config(BackendChoice::Auto, false));

    let replayed = run.calls.replayed.borrow();
    assert_eq!(replayed.len(), 1);
    let messages = &replayed[0].1;
    let pos = |needle: &str| messages.iter().position(|m| m.contains(needle)).unwrap();
    assert!(pos("Auto-selected webview") < pos("Pre-loading dependencies"));
    assert!(pos("Pre-loading dependencies") < pos("GPU detected: Intel"));
    assert!(run.sink.is_drained());
}

#[test]
fn preload_results_are_attached_to_the_app() {
    let run = launch(Setup::default(), config(BackendChoice::Egui, false));

    let contexts = run.calls.contexts.borrow();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].backend, Backend::Egui);
    assert_eq!(contexts[0].worker_threads, 4);
    assert_eq!(contexts[0].hardware.as_ref().unwrap()["gpu"], "Intel");
    assert!(contexts[0].preload_error.is_none());
}

#[test]
fn hardware_failure_degrades_without_failing() {
    let setup = Setup {
        hardware_fails: true,
        ..Setup::default()
    };
    let run = launch(setup, config(BackendChoice::Auto, true));

    assert_eq!(run.outcome.code(), 0);
    let contexts = run.calls.contexts.borrow();
    assert!(contexts[0].hardware.is_none());
    assert_eq!(contexts[0].preload_error.as_deref(), Some("GPU query crashed"));
}

#[test]
fn startup_failure_hands_records_to_the_fallback() {
    let setup = Setup {
        webview: Behaviour::StartupFails,
        ..Setup::default()
    };
    let run = launch(setup, config(BackendChoice::Auto, false));

    assert!(matches!(run.outcome, Outcome::Finished { backend: Backend::Egui }));
    let replayed = run.calls.replayed.borrow();
    assert_eq!(replayed.len(), 2);
    let (first, second) = (&replayed[0].1, &replayed[1].1);
    assert_eq!(&second[..first.len()], &first[..]);
    assert_eq!(
        &second[first.len()..],
        &[
            "webview interface failed to start: no OpenGL context".to_string(),
            "Falling back to egui interface".to_string(),
        ]
    );
    assert_eq!(
        &run.states[run.states.len() - 4..],
        &[
            LaunchState::BuildApp(Backend::Webview),
            LaunchState::Running(Backend::Webview),
            LaunchState::BuildApp(Backend::Egui),
            LaunchState::Running(Backend::Egui),
        ]
    );
}

#[test]
fn both_backends_failing_to_start_is_fatal() {
    let setup = Setup {
        webview: Behaviour::StartupFails,
        egui: Behaviour::StartupFails,
        ..Setup::default()
    };
    let run = launch(setup, config(BackendChoice::Auto, false));

    assert_eq!(run.outcome.code(), 1);
    assert_eq!(run.calls.builds.borrow().len(), 2);
}

#[test]
fn crash_after_start_is_not_retried() {
    let setup = Setup {
        webview: Behaviour::Crashes,
        ..Setup::default()
    };
    let run = launch(setup, config(BackendChoice::Auto, false));

    assert_eq!(run.outcome.code(), 1);
    assert!(matches!(run.outcome, Outcome::Failed(LaunchError::Crashed(_))));
    assert_eq!(*run.calls.builds.borrow(), vec![Backend::Webview]);
}

#[test]
fn exactly_one_preload_per_launch() {
    let setup = Setup {
        webview: Behaviour::BuildFails,
        ..Setup::default()
    };
    let run = launch(setup, config(BackendChoice::Auto, true));
    assert_eq!(run.calls.hardware_probes.load(Ordering::SeqCst), 1);
}

fn stuck_preload_continues_degraded(show_splash: bool) {
    let release = Arc::new(AtomicBool::new(false));
    let setup = Setup {
        hardware_release: Some(Arc::clone(&release)),
        preload_timeout: Duration::from_millis(50),
        ..Setup::default()
    };

    let started = Instant::now();
    let run = launch(setup, config(BackendChoice::Auto, show_splash));
    let took = started.elapsed();

    // The hardware probe is still spinning: launch returned without it.
    assert!(!release.load(Ordering::SeqCst));
    assert!(took < Duration::from_secs(2), "{took:?}");
    assert_eq!(run.outcome.code(), 0);
    assert!(run.states.contains(&LaunchState::BuildApp(Backend::Webview)));
    assert_eq!(run.calls.hardware_probes.load(Ordering::SeqCst), 1);
    {
        let contexts = run.calls.contexts.borrow();
        assert!(contexts[0].hardware.is_none());
        let error = contexts[0].preload_error.as_deref().unwrap();
        assert!(error.contains("did not finish within 50 ms"), "{error}");
    }
    release.store(true, Ordering::SeqCst);
}

#[test]
fn stuck_preload_without_splash_is_abandoned_at_the_deadline() {
    stuck_preload_continues_degraded(false);
}

#[test]
fn stuck_preload_with_splash_is_abandoned_at_the_deadline() {
    stuck_preload_continues_degraded(true);
}

#[test]
fn fallback_ui_sees_the_fallback_notice_after_a_build_failure() {
    let setup = Setup {
        webview: Behaviour::BuildFails,
        ..Setup::default()
    };
    let run = launch(setup, config(BackendChoice::Auto, false));

    let replayed = run.calls.replayed.borrow();
    assert_eq!(replayed.len(), 1);
    let messages = &replayed[0].1;
    assert!(messages.iter().any(|m| m.contains("Failed to load webview interface")));
    assert_eq!(messages.last().unwrap(), "Falling back to egui interface");
}
