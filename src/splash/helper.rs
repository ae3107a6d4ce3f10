use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use super::SplashScreen;
use crate::storage;

const SPLASH_HTML: &str = include_str!("../../assets/splash.html");

/// Printed on stdout by `smore-splash` once its window and webview exist.
const READY_LINE: &str = "ready";

/// How long the helper gets to put its window on screen.
const READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Splash rendered by the `smore-splash` helper process, so a misbehaving
/// webview cannot take the launcher down.
pub(crate) struct HelperSplash {
    auto_close: Duration,
    ready_timeout: Duration,
    command: fn(Duration) -> Result<Command>,
    child: Option<Child>,
}

impl HelperSplash {
    pub(crate) fn new(auto_close: Duration) -> Self {
        Self {
            auto_close,
            ready_timeout: READY_TIMEOUT,
            command: helper_command,
            child: None,
        }
    }
}

impl SplashScreen for HelperSplash {
    /// Succeeds only once the helper reports that its window is up. A helper
    /// that exits or stays silent is killed and reported as an error.
    fn show(&mut self) -> Result<()> {
        let mut command = (self.command)(self.auto_close)?;
        let mut child = command
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("launch {:?}", command.get_program()))?;
        tracing::debug!(pid = child.id(), "splash helper started");

        if let Err(e) = wait_until_ready(&mut child, self.ready_timeout) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }
        self.child = Some(child);
        Ok(())
    }

    fn close(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        // The helper may already be gone after its auto-close.
        if let Ok(None) = child.try_wait() {
            if let Err(e) = child.kill() {
                tracing::warn!("closing splash helper failed: {e}");
            }
        }
        let _ = child.wait();
    }
}

impl Drop for HelperSplash {
    fn drop(&mut self) {
        self.close();
    }
}

fn helper_command(auto_close: Duration) -> Result<Command> {
    let page = write_splash_page()?;
    let url = path_to_file_url(&page)?;
    let mut command = Command::new(locate_helper()?);
    command
        .arg(url)
        .arg("--auto-close-ms")
        .arg(auto_close.as_millis().to_string());
    Ok(command)
}

fn wait_until_ready(child: &mut Child, timeout: Duration) -> Result<()> {
    let stdout = child.stdout.take().context("splash helper stdout not captured")?;
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            match line {
                Ok(line) if line.trim() == READY_LINE => {
                    let _ = tx.send(());
                    return;
                }
                Ok(_) => {}
                Err(_) => return,
            }
        }
    });

    match rx.recv_timeout(timeout) {
        Ok(()) => Ok(()),
        Err(RecvTimeoutError::Timeout) => {
            bail!("splash helper did not report ready within {} ms", timeout.as_millis())
        }
        Err(RecvTimeoutError::Disconnected) => match child.try_wait() {
            Ok(Some(status)) => {
                Err(anyhow!("splash helper exited before showing a window ({status})"))
            }
            _ => Err(anyhow!("splash helper closed its output before showing a window")),
        },
    }
}

fn write_splash_page() -> Result<PathBuf> {
    let dir = storage::cache_dir()?.join("splash");
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join("smore-splash.html");
    fs::write(&path, SPLASH_HTML).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

fn helper_name() -> &'static str {
    if cfg!(windows) {
        "smore-splash.exe"
    } else {
        "smore-splash"
    }
}

/// Installed builds ship the helper next to the launcher; during development it
/// sits in the cargo target directory.
fn locate_helper() -> Result<PathBuf> {
    let current_exe = std::env::current_exe().context("get current exe")?;
    let exe_dir = current_exe.parent().context("resolve exe directory")?;

    let candidates = [
        exe_dir.join(helper_name()),
        Path::new("target").join("debug").join(helper_name()),
        Path::new("target").join("release").join(helper_name()),
    ];
    match candidates.iter().find(|p| p.exists()) {
        Some(found) => Ok(found.clone()),
        None => bail!("splash helper not found (expected {})", candidates[0].display()),
    }
}

fn path_to_file_url(path: &Path) -> Result<String> {
    let p = path.canonicalize().with_context(|| format!("canonicalize {}", path.display()))?;
    let mut s = p.to_string_lossy().replace('\\', "/");
    // Windows extended-length prefix.
    if let Some(stripped) = s.strip_prefix("//?/") {
        s = stripped.to_string();
    }
    Ok(file_url_from_slashed(&s))
}

fn file_url_from_slashed(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len() + 16);
    for ch in path.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '~' | '/' | ':') {
            encoded.push(ch);
        } else {
            let mut buf = [0u8; 4];
            for b in ch.encode_utf8(&mut buf).bytes() {
                encoded.push_str(&format!("%{b:02X}"));
            }
        }
    }

    // Drive letter paths (D:/...) need the extra slash.
    if encoded.as_bytes().get(1) == Some(&b':') {
        format!("file:///{encoded}")
    } else {
        format!("file://{encoded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_paths_keep_their_leading_slash() {
        assert_eq!(
            file_url_from_slashed("/tmp/smore/splash.html"),
            "file:///tmp/smore/splash.html"
        );
    }

    #[test]
    fn drive_letters_get_three_slashes() {
        assert_eq!(
            file_url_from_slashed("C:/Users/me/splash.html"),
            "file:///C:/Users/me/splash.html"
        );
    }

    #[test]
    fn reserved_and_non_ascii_characters_are_escaped() {
        assert_eq!(
            file_url_from_slashed("/home/zoë/my dir/#1.html"),
            "file:///home/zo%C3%AB/my%20dir/%231.html"
        );
    }

    #[test]
    fn closing_without_showing_is_a_no_op() {
        let mut splash = HelperSplash::new(Duration::from_secs(1));
        splash.close();
        assert!(splash.child.is_none());
    }

    #[test]
    fn bundled_page_is_html() {
        assert!(SPLASH_HTML.trim_start().starts_with("<!doctype html>"));
    }

    #[cfg(unix)]
    fn shell(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[cfg(unix)]
    fn splash_with(command: fn(Duration) -> Result<Command>) -> HelperSplash {
        HelperSplash {
            auto_close: Duration::from_secs(1),
            ready_timeout: Duration::from_millis(300),
            command,
            child: None,
        }
    }

    #[cfg(unix)]
    #[test]
    fn helper_exiting_before_ready_is_an_error() {
        let mut splash = splash_with(|_| Ok(shell("exit 127")));
        let err = splash.show().unwrap_err();
        assert!(err.to_string().contains("before showing a window"), "{err:#}");
        assert!(splash.child.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn silent_helper_times_out() {
        let mut splash = splash_with(|_| Ok(shell("exec sleep 30")));
        let err = splash.show().unwrap_err();
        assert_eq!(err.to_string(), "splash helper did not report ready within 300 ms");
        assert!(splash.child.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn ready_helper_is_kept_until_closed() {
        let mut splash = splash_with(|_| Ok(shell("echo ready; exec sleep 30")));
        splash.show().unwrap();
        assert!(splash.child.is_some());
        splash.close();
        assert!(splash.child.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn coordinator_skips_a_helper_that_dies_on_startup() {
        use crate::logsink::LogSink;
        use crate::models::Timings;
        use crate::preload::{HardwareInfo, HardwareProbe, Preloader};
        use crate::splash::{SplashCoordinator, SplashOutcome};
        use std::sync::Arc;

        struct NoHardware;

        impl HardwareProbe for NoHardware {
            fn probe(&self) -> Result<Option<HardwareInfo>> {
                Ok(None)
            }
        }

        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let sink = LogSink::default();
        let mut preload = Preloader::new(Arc::new(NoHardware), sink.clone()).start(rt.handle());
        let mut splash = splash_with(|_| Ok(shell("exit 127")));

        let coordinator = SplashCoordinator::new(Timings::default(), sink.clone());
        let started = std::time::Instant::now();
        let outcome = coordinator.run(&mut splash, &mut preload);

        assert_eq!(outcome, SplashOutcome::Skipped);
        assert!(started.elapsed() < Timings::default().splash_min);
        assert!(sink
            .drain()
            .iter()
            .any(|r| r.message.contains("starting without splash")));
    }
}
