//! Invoke-all: run a fixed set of independent actions concurrently and wait for every one.

use std::sync::Mutex;

use crate::error::{run_guarded, AggregateFailure, OperationFailure, OperationResult, Result};
use crate::pool::WorkerPool;

/// A zero-argument unit of work. May borrow from the caller's stack.
pub type Action<'a> = Box<dyn FnOnce() -> OperationResult + Send + 'a>;

/// Box a closure as an `Action`.
pub fn action<'a, F>(f: F) -> Action<'a>
where
    F: FnOnce() -> OperationResult + Send + 'a,
{
    Box::new(f)
}

/// Runs an ordered set of operations concurrently on the pool.
#[derive(Clone, Debug)]
pub struct Invoker {
    pool: WorkerPool,
}

impl Invoker {
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }

    /// Start every operation and block until all have finished.
    ///
    /// Each operation is its own task on the pool, so concurrency is bounded by
    /// the pool size. A failing operation never cuts the wait short: every
    /// failure (error or panic) is collected and returned together as an
    /// `AggregateFailure` once the last operation is done.
    pub fn invoke_all<'a, I>(&self, operations: I) -> Result<()>
    where
        I: IntoIterator<Item = Action<'a>>,
    {
        let operations: Vec<Action<'a>> = operations.into_iter().collect();
        if operations.is_empty() {
            return Ok(());
        }

        let failures: Mutex<Vec<OperationFailure>> = Mutex::new(Vec::new());
        log::debug!("invoking {} operations", operations.len());

        self.pool.thread_pool().scope(|scope| {
            for (index, op) in operations.into_iter().enumerate() {
                let failures = &failures;
                scope.spawn(move |_| {
                    if let Err(failure) = run_guarded(index as i64, op) {
                        push_failure(failures, failure);
                    }
                });
            }
        });

        let failures = failures.into_inner().unwrap_or_else(|e| e.into_inner());
        match AggregateFailure::from_failures(failures) {
            Some(aggregate) => Err(aggregate.into()),
            None => Ok(()),
        }
    }
}

pub(crate) fn push_failure(failures: &Mutex<Vec<OperationFailure>>, failure: OperationFailure) {
    failures
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .push(failure);
}
