//! The diagnostic monitor seam.
//!
//! Every public engine operation takes a monitor; all expected validation
//! failures are reported through it with stable, human-readable text.

use std::sync::Mutex;

/// Structured diagnostic sink.
pub trait Monitor: Send + Sync {
    /// Report progress information.
    fn info(&self, message: &str);

    /// Report a validation or execution failure.
    fn error(&self, message: &str);
}

/// Monitor that forwards onto the `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMonitor;

impl TracingMonitor {
    /// Create a tracing-backed monitor.
    pub fn new() -> Self {
        Self
    }
}

impl Monitor for TracingMonitor {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Severity of a recorded monitor entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorLevel {
    /// Progress information.
    Info,
    /// Validation or execution failure.
    Error,
}

/// One recorded diagnostic.
#[derive(Debug, Clone)]
pub struct MonitorEntry {
    /// Severity.
    pub level: MonitorLevel,
    /// The reported text.
    pub message: String,
}

/// Monitor that records entries for later inspection.
#[derive(Debug, Default)]
pub struct BufferMonitor {
    entries: Mutex<Vec<MonitorEntry>>,
}

impl BufferMonitor {
    /// Create an empty recording monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries, in report order.
    pub fn entries(&self) -> Vec<MonitorEntry> {
        self.entries.lock().expect("monitor poisoned").clone()
    }

    /// The messages of all error-level entries, in report order.
    pub fn errors(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("monitor poisoned")
            .iter()
            .filter(|e| e.level == MonitorLevel::Error)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Whether any error-level entry was recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    fn push(&self, level: MonitorLevel, message: &str) {
        self.entries
            .lock()
            .expect("monitor poisoned")
            .push(MonitorEntry {
                level,
                message: message.to_string(),
            });
    }
}

impl Monitor for BufferMonitor {
    fn info(&self, message: &str) {
        self.push(MonitorLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(MonitorLevel::Error, message);
    }
}
