//! Log sinks: where timing reports and diagnostics lines go.

use std::sync::Mutex;

/// Accepts formatted report lines.
pub trait LogSink: Send + Sync {
    fn line(&self, line: &str);
}

impl<S: LogSink + ?Sized> LogSink for &S {
    fn line(&self, line: &str) {
        (**self).line(line)
    }
}

impl<S: LogSink + ?Sized> LogSink for std::sync::Arc<S> {
    fn line(&self, line: &str) {
        (**self).line(line)
    }
}

/// Forwards every line to the `log` facade at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogFacadeSink;

impl LogSink for LogFacadeSink {
    fn line(&self, line: &str) {
        log::info!(target: "tandem", "{}", line);
    }
}

/// Keeps lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|l| l.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
    }
}
