//! Diagnostic records produced before any UI exists.
//!
//! The sink is created once in `main` and cloned into every component that logs.
//! Each logging call buffers a [`LogRecord`] and forwards the same message to
//! `tracing`, so the console and the log file see it immediately while the live
//! application receives the buffered copy once it is built.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

pub(crate) const DEFAULT_CAPACITY: usize = 1000;
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogRecord {
    pub(crate) timestamp: DateTime<Local>,
    pub(crate) source: String,
    pub(crate) severity: Severity,
    pub(crate) message: String,
}

impl LogRecord {
    pub(crate) fn new(
        source: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            source: source.into(),
            severity,
            message: message.into(),
        }
    }
}

/// `timestamp - source - SEVERITY - message`, the same shape as the log file.
impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {} - {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.source,
            self.severity,
            self.message
        )
    }
}

#[derive(Debug)]
struct Buffer {
    records: VecDeque<LogRecord>,
    capacity: usize,
    evicted: u64,
    drained: bool,
}

/// Bounded FIFO of [`LogRecord`]s, shared between the launcher and the preload worker.
#[derive(Debug, Clone)]
pub(crate) struct LogSink {
    inner: Arc<Mutex<Buffer>>,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl LogSink {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(Buffer {
                records: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
                capacity,
                evicted: 0,
                drained: false,
            })),
        }
    }

    /// Appends a record, evicting the oldest one when full. Records arriving after
    /// [`LogSink::drain`] are dropped: the UI that took the buffer never sees them.
    pub(crate) fn record(&self, entry: LogRecord) {
        let mut buf = self.inner.lock();
        if buf.drained {
            return;
        }
        buf.records.push_back(entry);
        if buf.records.len() > buf.capacity {
            buf.records.pop_front();
            buf.evicted += 1;
        }
    }

    /// Takes every buffered record in insertion order and seals the sink.
    pub(crate) fn drain(&self) -> Vec<LogRecord> {
        let mut buf = self.inner.lock();
        buf.drained = true;
        buf.records.drain(..).collect()
    }

    #[cfg(test)]
    pub(crate) fn is_drained(&self) -> bool {
        self.inner.lock().drained
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// Number of records dropped to stay within capacity.
    pub(crate) fn evicted(&self) -> u64 {
        self.inner.lock().evicted
    }

    pub(crate) fn log(&self, source: &str, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Debug => tracing::debug!(source, "{message}"),
            Severity::Info => tracing::info!(source, "{message}"),
            Severity::Warning => tracing::warn!(source, "{message}"),
            Severity::Error => tracing::error!(source, "{message}"),
        }
        self.record(LogRecord::new(source, severity, message));
    }

    pub(crate) fn debug(&self, source: &str, message: impl Into<String>) {
        self.log(source, Severity::Debug, message);
    }

    pub(crate) fn info(&self, source: &str, message: impl Into<String>) {
        self.log(source, Severity::Info, message);
    }

    pub(crate) fn warn(&self, source: &str, message: impl Into<String>) {
        self.log(source, Severity::Warning, message);
    }

    pub(crate) fn error(&self, source: &str, message: impl Into<String>) {
        self.log(source, Severity::Error, message);
    }
}
