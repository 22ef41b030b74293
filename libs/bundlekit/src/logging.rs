//! Bundle-scoped logging.
//!
//! The host decides where log lines go by supplying a [`LogSink`]; bundles only see a
//! [`BundleLogger`] that tags every message with their name.

use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        })
    }
}

/// Destination for bundle log lines.
pub trait LogSink: Send + Sync {
    fn log(&self, bundle: &str, level: LogLevel, message: &str);
}

/// Forwards to `tracing` under the `bundle` target with a `bundle` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, bundle: &str, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "bundle", bundle, "{message}"),
            LogLevel::Info => tracing::info!(target: "bundle", bundle, "{message}"),
            LogLevel::Warn => tracing::warn!(target: "bundle", bundle, "{message}"),
            LogLevel::Error => tracing::error!(target: "bundle", bundle, "{message}"),
        }
    }
}

/// Logger handed to a bundle through its context.
#[derive(Clone)]
pub struct BundleLogger {
    bundle: Arc<str>,
    sink: Arc<dyn LogSink>,
}

impl BundleLogger {
    pub fn new(bundle: impl Into<Arc<str>>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            bundle: bundle.into(),
            sink,
        }
    }

    #[must_use]
    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        self.sink.log(&self.bundle, level, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

impl fmt::Debug for BundleLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleLogger")
            .field("bundle", &self.bundle)
            .finish_non_exhaustive()
    }
}
