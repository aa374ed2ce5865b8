//! Producer followed by exactly one of two continuations, off the caller's thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};

use crate::error::{flatten_failure, run_guarded, BoxError, OperationFailure, OperationResult};
use crate::pool::WorkerPool;

/// Target for failures nobody handled.
pub const UNOBSERVED_TARGET: &str = "tandem::unobserved";

/// Tagged result of the producer step.
#[derive(Debug)]
pub enum ContinuationOutcome<T> {
    Success(T),
    Failure(Vec<OperationFailure>),
}

impl<T> ContinuationOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ContinuationOutcome::Success(_))
    }
}

/// Which branch a finished pipeline took.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Branch {
    /// The success continuation ran (or the producer succeeded with none registered).
    Success,
    /// The failure continuation received the producer's errors.
    Failure,
    /// A failure reached no continuation and was reported as unobserved.
    Unobserved,
}

type Producer<T> = Box<dyn FnOnce() -> std::result::Result<T, BoxError> + Send>;
type SuccessFn<T> = Box<dyn FnOnce(T) -> OperationResult + Send>;
type FailureFn = Box<dyn FnOnce(Vec<OperationFailure>) -> OperationResult + Send>;

/// Builder form: register either, both or no continuations, then start on a pool.
pub struct Continuation<T> {
    producer: Producer<T>,
    on_success: Option<SuccessFn<T>>,
    on_failure: Option<FailureFn>,
}

impl<T: Send + 'static> Continuation<T> {
    pub fn new<P>(producer: P) -> Self
    where
        P: FnOnce() -> std::result::Result<T, BoxError> + Send + 'static,
    {
        Self {
            producer: Box::new(producer),
            on_success: None,
            on_failure: None,
        }
    }

    /// Runs only when the producer completed normally.
    pub fn on_success<S>(mut self, f: S) -> Self
    where
        S: FnOnce(T) -> OperationResult + Send + 'static,
    {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Runs only when the producer raised; receives every underlying error.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Vec<OperationFailure>) -> OperationResult + Send + 'static,
    {
        self.on_failure = Some(Box::new(f));
        self
    }

    /// Schedule on `pool` and return immediately.
    pub fn start(self, pool: &WorkerPool) -> ContinuationHandle {
        let (tx, rx) = mpsc::channel();
        pool.thread_pool().spawn(move || {
            let branch = self.run();
            let _ = tx.send(branch);
        });
        ContinuationHandle { rx }
    }

    fn run(self) -> Branch {
        let Continuation {
            producer,
            on_success,
            on_failure,
        } = self;

        match produce(producer) {
            ContinuationOutcome::Success(value) => {
                if let Some(f) = on_success {
                    if let Err(failure) = run_guarded(0, move || f(value)) {
                        report_unobserved("success continuation", &[failure]);
                        return Branch::Unobserved;
                    }
                }
                Branch::Success
            }
            ContinuationOutcome::Failure(failures) => match on_failure {
                Some(f) => {
                    if let Err(failure) = run_guarded(0, move || f(failures)) {
                        report_unobserved("failure continuation", &[failure]);
                        return Branch::Unobserved;
                    }
                    Branch::Failure
                }
                None => {
                    report_unobserved("producer", &failures);
                    Branch::Unobserved
                }
            },
        }
    }
}

fn produce<T>(producer: Producer<T>) -> ContinuationOutcome<T> {
    match panic::catch_unwind(AssertUnwindSafe(producer)) {
        Ok(Ok(value)) => ContinuationOutcome::Success(value),
        Ok(Err(err)) => ContinuationOutcome::Failure(flatten_failure(0, err)),
        Err(payload) => ContinuationOutcome::Failure(vec![OperationFailure::from_panic(0, payload)]),
    }
}

fn report_unobserved(stage: &str, failures: &[OperationFailure]) {
    for failure in failures {
        log::error!(target: UNOBSERVED_TARGET, "unobserved failure in {}: {}", stage, failure);
    }
}

/// Completion handle of a started pipeline. Dropping it does not cancel anything.
#[derive(Debug)]
pub struct ContinuationHandle {
    rx: Receiver<Branch>,
}

impl ContinuationHandle {
    /// Block until the pipeline has finished and report which branch ran.
    pub fn wait(self) -> Branch {
        // The sender is only dropped without sending if the pool thread died
        // outside our guards; treat that as unobserved.
        self.rx.recv().unwrap_or(Branch::Unobserved)
    }
}

/// Runs producers with success/failure continuations on a pool.
#[derive(Clone, Debug)]
pub struct ContinuationPipeline {
    pool: WorkerPool,
}

impl ContinuationPipeline {
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }

    /// Run `producer` on the pool, then exactly one of `on_success` / `on_failure`.
    pub fn run_with_continuations<T, P, S, F>(
        &self,
        producer: P,
        on_success: S,
        on_failure: F,
    ) -> ContinuationHandle
    where
        T: Send + 'static,
        P: FnOnce() -> std::result::Result<T, BoxError> + Send + 'static,
        S: FnOnce(T) -> OperationResult + Send + 'static,
        F: FnOnce(Vec<OperationFailure>) -> OperationResult + Send + 'static,
    {
        Continuation::new(producer)
            .on_success(on_success)
            .on_failure(on_failure)
            .start(&self.pool)
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AggregateFailure;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    fn pipeline() -> ContinuationPipeline {
        ContinuationPipeline::new(WorkerPool::with_workers(2).unwrap())
    }

    #[test]
    fn test_success_runs_only_success_continuation() {
        let got = Arc::new(Mutex::new(None));
        let got_clone = Arc::clone(&got);
        let branch = pipeline()
            .run_with_continuations(
                || Ok(21 * 2),
                move |v| {
                    *got_clone.lock().unwrap() = Some(v);
                    Ok(())
                },
                |_| panic!("failure continuation must not run"),
            )
            .wait();
        assert_eq!(branch, Branch::Success);
        assert_eq!(*got.lock().unwrap(), Some(42));
    }

    #[test]
    fn test_failing_producer_runs_failure_exactly_once() {
        let pipeline = pipeline();
        let successes = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let s = Arc::clone(&successes);
            let f = Arc::clone(&failures);
            let branch = pipeline
                .run_with_continuations(
                    || -> std::result::Result<(), BoxError> {
                        Err("Ops! An error occurred!".into())
                    },
                    move |_| {
                        s.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    },
                    move |errors| {
                        assert!(!errors.is_empty());
                        f.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    },
                )
                .wait();
            assert_eq!(branch, Branch::Failure);
        }

        assert_eq!(successes.load(Ordering::SeqCst), 0);
        assert_eq!(failures.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_failure_continuation_receives_thrown_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        pipeline()
            .run_with_continuations(
                || -> std::result::Result<(), BoxError> { Err("boom".into()) },
                |_| Ok(()),
                move |errors| {
                    let mut seen = seen_clone.lock().unwrap();
                    seen.extend(errors.iter().map(|e| e.to_string()));
                    Ok(())
                },
            )
            .wait();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("boom"));
    }

    #[test]
    fn test_aggregate_is_flattened() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        pipeline()
            .run_with_continuations(
                || -> std::result::Result<(), BoxError> {
                    let agg = AggregateFailure::from_failures(vec![
                        OperationFailure::Failed { index: 0, source: "a".into() },
                        OperationFailure::Failed { index: 1, source: "b".into() },
                        OperationFailure::Panicked { index: 2, message: "c".into() },
                    ])
                    .unwrap();
                    Err(Box::new(agg))
                },
                |_| Ok(()),
                move |errors| {
                    count_clone.store(errors.len(), Ordering::SeqCst);
                    Ok(())
                },
            )
            .wait();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_panicking_producer_reaches_failure() {
        let branch = pipeline()
            .run_with_continuations(
                || -> std::result::Result<u8, BoxError> { panic!("producer blew up") },
                |_| Ok(()),
                |errors| {
                    assert!(matches!(errors[0], OperationFailure::Panicked { .. }));
                    Ok(())
                },
            )
            .wait();
        assert_eq!(branch, Branch::Failure);
    }

    #[test]
    fn test_missing_failure_continuation_is_unobserved() {
        let pool = WorkerPool::with_workers(1).unwrap();
        let branch = Continuation::new(|| -> std::result::Result<(), BoxError> { Err("lost".into()) })
            .on_success(|_| Ok(()))
            .start(&pool)
            .wait();
        assert_eq!(branch, Branch::Unobserved);
    }

    #[test]
    fn test_failing_continuation_is_unobserved() {
        let branch = pipeline()
            .run_with_continuations(|| Ok(()), |_| Err("continuation failed".into()), |_| Ok(()))
            .wait();
        assert_eq!(branch, Branch::Unobserved);
    }

    #[test]
    fn test_produce_tags_outcome() {
        let ok: Producer<i32> = Box::new(|| Ok(1));
        assert!(produce(ok).is_success());

        let failing: Producer<i32> = Box::new(|| Err("x".into()));
        match produce(failing) {
            ContinuationOutcome::Failure(failures) => assert_eq!(failures.len(), 1),
            ContinuationOutcome::Success(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_does_not_block_caller() {
        let start = Instant::now();
        let handle = pipeline().run_with_continuations(
            || {
                thread::sleep(Duration::from_millis(200));
                Ok(())
            },
            |_| Ok(()),
            |_| Ok(()),
        );
        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(handle.wait(), Branch::Success);
    }
}
