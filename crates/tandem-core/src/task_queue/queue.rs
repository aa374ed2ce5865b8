//! Fire-and-forget work queue
//!
//! Items are handed to the pool in FIFO order; the pool may still finish them
//! in any order. Handler failures never reach the caller of `enqueue`: they are
//! logged at `warn` and counted in `QueueStats::failed` (log-and-drop).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::error::{run_guarded, OperationResult};
use crate::pool::WorkerPool;

/// Counters for a work queue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub enqueued: u64,
    pub completed: u64,
    /// Handler failures that were logged and dropped
    pub failed: u64,
}

impl QueueStats {
    /// Items enqueued but not yet finished
    pub fn pending(&self) -> u64 {
        self.enqueued.saturating_sub(self.completed)
    }
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    /// Guards idle notification; holds nothing
    idle_lock: Mutex<()>,
    idle: Condvar,
}

impl Counters {
    fn snapshot(&self) -> QueueStats {
        QueueStats {
            enqueued: self.enqueued.load(Ordering::Acquire),
            completed: self.completed.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
        }
    }

    fn finish_one(&self) {
        let _guard = self.idle_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.completed.fetch_add(1, Ordering::AcqRel);
        self.idle.notify_all();
    }
}

/// FIFO hand-off of work items to the pool
#[derive(Clone, Debug)]
pub struct WorkQueue {
    pool: WorkerPool,
    counters: Arc<Counters>,
}

impl WorkQueue {
    pub fn new(pool: WorkerPool) -> Self {
        Self {
            pool,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Queue `handler(parameter)` and return immediately.
    ///
    /// The handler runs exactly once on a pool worker.
    pub fn enqueue<P, H>(&self, parameter: P, handler: H)
    where
        P: Send + 'static,
        H: FnOnce(P) -> OperationResult + Send + 'static,
    {
        let seq = self.counters.enqueued.fetch_add(1, Ordering::AcqRel);
        let counters = Arc::clone(&self.counters);
        self.pool.thread_pool().spawn_fifo(move || {
            if let Err(failure) = run_guarded(seq as i64, move || handler(parameter)) {
                counters.failed.fetch_add(1, Ordering::AcqRel);
                log::warn!("dropped work item failure: {}", failure);
            }
            counters.finish_one();
        });
    }

    /// Queue a batch of parameters for the same handler
    pub fn enqueue_batch<P, H>(&self, parameters: Vec<P>, handler: H)
    where
        P: Send + 'static,
        H: Fn(P) -> OperationResult + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        for parameter in parameters {
            let handler = Arc::clone(&handler);
            self.enqueue(parameter, move |p| (*handler)(p));
        }
    }

    /// Get a snapshot of the counters
    pub fn stats(&self) -> QueueStats {
        self.counters.snapshot()
    }

    /// Block until every item enqueued so far has run.
    pub fn wait_idle(&self) {
        let mut guard = self.counters.idle_lock.lock().unwrap_or_else(|e| e.into_inner());
        while self.counters.snapshot().pending() > 0 {
            guard = self
                .counters
                .idle
                .wait(guard)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Like `wait_idle`, giving up after `timeout`. Returns true if idle.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let guard = self.counters.idle_lock.lock().unwrap_or_else(|e| e.into_inner());
        let (_guard, result) = self
            .counters
            .idle
            .wait_timeout_while(guard, timeout, |_| self.counters.snapshot().pending() > 0)
            .unwrap_or_else(|e| e.into_inner());
        !result.timed_out()
    }

    /// Get number of workers
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_enqueue_returns_immediately_and_runs_each_once() {
        let queue = WorkQueue::new(WorkerPool::with_workers(4).unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let start = Instant::now();
        for i in 0..10 {
            let seen = Arc::clone(&seen);
            queue.enqueue(i, move |p| {
                thread::sleep(Duration::from_millis(50));
                seen.lock().unwrap().push(p);
                Ok(())
            });
        }
        assert!(start.elapsed() < Duration::from_millis(50));

        queue.wait_idle();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 10);
        let unique: HashSet<_> = seen.iter().copied().collect();
        assert_eq!(unique, (0..10).collect::<HashSet<_>>());

        let stats = queue.stats();
        assert_eq!(stats.enqueued, 10);
        assert_eq!(stats.completed, 10);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.pending(), 0);
    }

    #[test]
    fn test_single_worker_preserves_fifo_order() {
        let queue = WorkQueue::new(WorkerPool::with_workers(1).unwrap());
        let order = Arc::new(Mutex::new(Vec::new()));
        let order_clone = Arc::clone(&order);
        queue.enqueue_batch((0..20).collect(), move |p: i32| {
            order_clone.lock().unwrap().push(p);
            Ok(())
        });
        queue.wait_idle();
        assert_eq!(*order.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_failures_are_logged_and_dropped() {
        let queue = WorkQueue::new(WorkerPool::with_workers(2).unwrap());
        queue.enqueue((), |_| Err("handler error".into()));
        queue.enqueue((), |_| panic!("handler panic"));
        queue.enqueue((), |_| Ok(()));

        assert!(queue.wait_idle_timeout(Duration::from_secs(5)));
        let stats = queue.stats();
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.failed, 2);
    }

    #[test]
    fn test_wait_idle_on_empty_queue() {
        let queue = WorkQueue::new(WorkerPool::with_workers(1).unwrap());
        queue.wait_idle();
        assert!(queue.wait_idle_timeout(Duration::from_millis(10)));
    }
}
