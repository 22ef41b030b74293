//! Test helpers shared by bundle crates.

use parking_lot::Mutex;

use crate::logging::{LogLevel, LogSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub bundle: String,
    pub level: LogLevel,
    pub message: String,
}

/// In-memory [`LogSink`] that keeps every record for later assertions.
#[derive(Debug, Default)]
pub struct RecordingLogSink {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLogSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Messages logged by `bundle` at `level`, in order.
    #[must_use]
    pub fn messages(&self, bundle: &str, level: LogLevel) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.bundle == bundle && r.level == level)
            .map(|r| r.message.clone())
            .collect()
    }

    /// Whether `bundle` logged a message at `level` containing `needle`.
    #[must_use]
    pub fn contains(&self, bundle: &str, level: LogLevel, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|r| r.bundle == bundle && r.level == level && r.message.contains(needle))
    }
}

impl LogSink for RecordingLogSink {
    fn log(&self, bundle: &str, level: LogLevel, message: &str) {
        self.records.lock().push(LogRecord {
            bundle: bundle.to_owned(),
            level,
            message: message.to_owned(),
        });
    }
}
