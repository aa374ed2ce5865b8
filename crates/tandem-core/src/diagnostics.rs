//! Thread diagnostics for reports. Read-only snapshots; nothing here affects scheduling.

use std::thread::{self, ThreadId};

/// Snapshot of the current thread as seen by the scheduler
#[derive(Clone, Debug)]
pub struct ThreadDiagnostics {
    pub name: Option<String>,
    pub id: ThreadId,
    /// Index within the rayon pool, if this thread is a pool worker
    pub pool_index: Option<usize>,
    /// OS threads in this process at capture time, where the platform exposes it
    pub process_threads: Option<usize>,
}

impl ThreadDiagnostics {
    pub fn capture() -> Self {
        let current = thread::current();
        Self {
            name: current.name().map(String::from),
            id: current.id(),
            pool_index: rayon::current_thread_index(),
            process_threads: process_thread_count(),
        }
    }

    pub fn is_pool_thread(&self) -> bool {
        self.pool_index.is_some()
    }

    /// Render for a log sink
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Name: {}", self.name.as_deref().unwrap_or("<unnamed>")),
            format!("Id: {:?}", self.id),
            format!(
                "Pool Index: {}",
                self.pool_index
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ),
            format!("Is Thread in Pool Thread? {}", self.is_pool_thread()),
            format!(
                "Threads Count: {}",
                self.process_threads
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            ),
        ]
    }
}

/// Number of OS threads in this process, where the platform exposes it.
pub fn process_thread_count() -> Option<usize> {
    #[cfg(target_os = "linux")]
    {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        status
            .lines()
            .find_map(|line| line.strip_prefix("Threads:"))
            .and_then(|v| v.trim().parse().ok())
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}
