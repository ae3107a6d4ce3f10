//! Tracing setup: stderr for humans, an append-only file for post-mortems.

use std::fmt::{self, Write as _};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::logsink::TIMESTAMP_FORMAT;

pub(crate) const LOG_ENV: &str = "SMORE_LOG";

/// Installs the global subscriber. The file layer is skipped (with a warning) if
/// `log_path` is `None` or cannot be opened.
pub(crate) fn init_tracing(log_path: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, file_error) = match log_path.map(open_log_file).transpose() {
        Ok(file) => (
            file.map(|f| {
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .event_format(DiagnosticLine)
                    .with_writer(Mutex::new(f))
            }),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;

    if let Some(e) = file_error {
        tracing::warn!("log file disabled: {e:#}");
    }
    Ok(())
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))
}

fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// `timestamp - source - SEVERITY - message`, one event per line.
///
/// `source` is the event's `source` field when present (the launcher components
/// set it), otherwise the event target.
pub(crate) struct DiagnosticLine;

impl<S, N> FormatEvent<S, N> for DiagnosticLine
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let mut fields = LineFields::default();
        event.record(&mut fields);

        let source = fields.source.as_deref().unwrap_or_else(|| meta.target());
        write!(
            writer,
            "{} - {} - {} - {}",
            Local::now().format(TIMESTAMP_FORMAT),
            source,
            level_name(meta.level()),
            fields.message
        )?;
        if !fields.extra.is_empty() {
            write!(writer, " ({})", fields.extra)?;
        }
        writeln!(writer)
    }
}

#[derive(Default)]
struct LineFields {
    source: Option<String>,
    message: String,
    extra: String,
}

impl Visit for LineFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "source" => self.source = Some(value.to_string()),
            "message" => self.message = value.to_string(),
            name => self.push_extra(name, format_args!("{value}")),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "source" => self.source = Some(format!("{value:?}")),
            "message" => self.message = format!("{value:?}"),
            name => self.push_extra(name, format_args!("{value:?}")),
        }
    }
}

impl LineFields {
    fn push_extra(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.extra.is_empty() {
            self.extra.push(' ');
        }
        let _ = write!(self.extra, "{name}={value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capture_with<F: FnOnce()>(f: F) -> String {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .event_format(DiagnosticLine)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        capture.text()
    }

    #[test]
    fn source_field_replaces_target() {
        let out = capture_with(|| tracing::warn!(source = "preload", "GPU probe failed"));
        assert!(out.ends_with(" - preload - WARNING - GPU probe failed\n"), "{out}");
    }

    #[test]
    fn target_is_used_without_source() {
        let out = capture_with(|| tracing::info!(attempt = 2, "building"));
        let expected = " - smore_desktop::logfile::tests - INFO - building (attempt=2)";
        assert!(out.contains(expected), "{out}");
    }

    #[test]
    fn one_line_per_event() {
        let out = capture_with(|| {
            tracing::info!("one");
            tracing::error!("two");
        });
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with(" - ERROR - two"));
    }
}
