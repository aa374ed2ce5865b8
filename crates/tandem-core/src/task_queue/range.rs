//! Parallel range with cooperative, lowest-index-wins break.
//!
//! Workers pull indices from a shared cursor that only moves forward, so by the
//! time index `k` is handed out every index below `k` has already been
//! dispatched. A break at `k` therefore never skips a lower index: it only stops
//! workers from pulling further indices. Bodies already running are left alone.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{
    run_guarded, AggregateFailure, OperationFailure, OperationResult, Result, TandemError,
};
use crate::pool::WorkerPool;
use crate::task_queue::invoke::push_failure;

/// Outcome of one `for_range` run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopResult {
    completed: bool,
    lowest_break_index: Option<i64>,
}

impl LoopResult {
    fn finished() -> Self {
        Self {
            completed: true,
            lowest_break_index: None,
        }
    }

    /// True iff no body requested a break.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Minimum index among all break requests.
    pub fn lowest_break_index(&self) -> Option<i64> {
        self.lowest_break_index
    }
}

/// Break bookkeeping shared by every worker of one run.
#[derive(Debug)]
struct BreakState {
    requested: AtomicBool,
    lowest: AtomicI64,
}

impl BreakState {
    fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            lowest: AtomicI64::new(i64::MAX),
        }
    }

    fn request(&self, index: i64) {
        self.lowest.fetch_min(index, Ordering::AcqRel);
        self.requested.store(true, Ordering::Release);
    }

    fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    fn lowest(&self) -> Option<i64> {
        if self.is_requested() {
            Some(self.lowest.load(Ordering::Acquire))
        } else {
            None
        }
    }
}

/// Controller handed to the loop body for the index it is processing.
#[derive(Debug)]
pub struct LoopState<'a> {
    index: i64,
    shared: &'a BreakState,
}

impl LoopState<'_> {
    /// Ask the loop to stop starting new indices.
    ///
    /// Cooperative: bodies already running finish normally. Safe to call any
    /// number of times from any worker; the lowest index wins.
    pub fn request_break(&self) {
        self.shared.request(self.index);
    }

    /// Index this state was handed out for
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Whether any body of this run has requested a break so far
    pub fn is_break_requested(&self) -> bool {
        self.shared.is_requested()
    }

    /// Lowest break index seen so far
    pub fn lowest_break_index(&self) -> Option<i64> {
        self.shared.lowest()
    }
}

/// Executes a per-index body over `[start, end)` on the pool.
#[derive(Clone, Debug)]
pub struct RangeExecutor {
    pool: WorkerPool,
    max_workers: Option<usize>,
}

impl RangeExecutor {
    pub fn new(pool: WorkerPool) -> Self {
        Self {
            pool,
            max_workers: None,
        }
    }

    /// Cap the number of workers pulling indices (at least 1).
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers.max(1));
        self
    }

    fn worker_count(&self, len: u64) -> usize {
        let configured = self
            .max_workers
            .unwrap_or_else(|| self.pool.worker_count())
            .max(1);
        usize::try_from(len).map_or(configured, |len| configured.min(len))
    }

    /// Run `body` for each index in `[start, end)`.
    ///
    /// Returns once every dispatched index has finished. Failures (errors or
    /// panics) stop further dispatch like a break does and are returned together
    /// as an `AggregateFailure`.
    pub fn for_range<F>(&self, start: i64, end: i64, body: F) -> Result<LoopResult>
    where
        F: Fn(i64, &LoopState<'_>) -> OperationResult + Sync,
    {
        if start > end {
            return Err(TandemError::InvalidRange { start, end });
        }
        if start == end {
            return Ok(LoopResult::finished());
        }

        let len = end.abs_diff(start);
        let workers = self.worker_count(len);
        // offsets from `start`, so the cursor cannot overflow near i64::MAX
        let cursor = AtomicU64::new(0);
        let breaks = BreakState::new();
        let faulted = AtomicBool::new(false);
        let processed = AtomicUsize::new(0);
        let failures: Mutex<Vec<OperationFailure>> = Mutex::new(Vec::new());

        log::debug!(
            "for_range [{}, {}) on {} workers",
            start,
            end,
            workers
        );

        self.pool.thread_pool().scope(|scope| {
            for _ in 0..workers {
                let (body, cursor, breaks, faulted, processed, failures) =
                    (&body, &cursor, &breaks, &faulted, &processed, &failures);
                scope.spawn(move |_| loop {
                    if breaks.is_requested() || faulted.load(Ordering::Acquire) {
                        break;
                    }
                    let offset = cursor.fetch_add(1, Ordering::AcqRel);
                    if offset >= len {
                        break;
                    }
                    let index = start.wrapping_add(offset as i64);
                    let state = LoopState {
                        index,
                        shared: breaks,
                    };
                    processed.fetch_add(1, Ordering::Relaxed);
                    if let Err(failure) = run_guarded(index, || body(index, &state)) {
                        faulted.store(true, Ordering::Release);
                        push_failure(failures, failure);
                    }
                });
            }
        });

        log::debug!(
            "for_range [{}, {}) processed {} indices",
            start,
            end,
            processed.load(Ordering::Relaxed)
        );

        let failures = failures.into_inner().unwrap_or_else(|e| e.into_inner());
        if let Some(aggregate) = AggregateFailure::from_failures(failures) {
            return Err(aggregate.into());
        }

        Ok(match breaks.lowest() {
            Some(lowest) => LoopResult {
                completed: false,
                lowest_break_index: Some(lowest),
            },
            None => LoopResult::finished(),
        })
    }
}
