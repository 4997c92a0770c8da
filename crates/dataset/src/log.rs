//! Logging capability handed to the validator instead of a process-wide logger.

use std::sync::Mutex;

pub trait ValidationLog: Send + Sync {
    fn info(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Forwards to `tracing` under the `dataset::validator` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLog;

impl ValidationLog for TracingLog {
    fn info(&self, msg: &str) {
        tracing::info!(target: "dataset::validator", "{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!(target: "dataset::validator", "{msg}");
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogLine {
    Info(String),
    Error(String),
}

/// Keeps every line in memory. Used by tests and by callers that want the
/// diagnostics alongside the report.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<LogLine>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|l| match l {
                LogLine::Error(m) => Some(m),
                LogLine::Info(_) => None,
            })
            .collect()
    }

    fn push(&self, line: LogLine) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

impl ValidationLog for MemoryLog {
    fn info(&self, msg: &str) {
        self.push(LogLine::Info(msg.to_string()));
    }

    fn error(&self, msg: &str) {
        self.push(LogLine::Error(msg.to_string()));
    }
}
