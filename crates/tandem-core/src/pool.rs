//! Explicitly constructed worker pool shared by the executors.
//!
//! There is no process-wide pool: callers build a `WorkerPool` and hand clones
//! of it to each component, so pool sizing and lifetime stay under their control.

use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::Result;

/// Configuration for a worker pool
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of workers (None = available hardware concurrency)
    pub workers: Option<usize>,
    /// Worker threads are named `{prefix}-{index}`
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: None,
            thread_name_prefix: "tandem-worker".to_string(),
        }
    }
}

impl PoolConfig {
    /// Create a new config with the default sizing
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of workers
    pub fn workers(mut self, count: usize) -> Self {
        self.workers = Some(count.max(1));
        self
    }

    /// Set the worker thread name prefix
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Worker count this config resolves to
    pub fn resolved_workers(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Build the pool
    pub fn build(&self) -> Result<WorkerPool> {
        WorkerPool::new(self)
    }
}

/// Fixed-size pool of worker threads. Cloning shares the same threads.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<ThreadPool>,
    worker_count: usize,
}

impl WorkerPool {
    pub fn new(config: &PoolConfig) -> Result<Self> {
        let worker_count = config.resolved_workers();
        let prefix = config.thread_name_prefix.clone();
        let inner = ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(move |i| format!("{}-{}", prefix, i))
            .build()?;
        log::debug!("built worker pool with {} workers", worker_count);
        Ok(Self {
            inner: Arc::new(inner),
            worker_count,
        })
    }

    /// Pool with `count` workers and default naming
    pub fn with_workers(count: usize) -> Result<Self> {
        PoolConfig::new().workers(count).build()
    }

    /// Get number of workers
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub(crate) fn thread_pool(&self) -> &ThreadPool {
        &self.inner
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("worker_count", &self.worker_count)
            .finish()
    }
}
