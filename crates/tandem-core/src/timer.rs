//! Wall-clock timing of a synchronous action, reported to a log sink.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::sink::LogSink;

/// Default threshold above which a timed action is logged as slow
pub const DEFAULT_SLOW_OPERATION_MS: u64 = 5000;

pub struct ActionTimer<S> {
    sink: S,
    slow_threshold: Duration,
}

impl<S: LogSink> ActionTimer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            slow_threshold: Duration::from_millis(DEFAULT_SLOW_OPERATION_MS),
        }
    }

    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Time `action` and report `name` plus elapsed milliseconds.
    ///
    /// The report is written even when the action fails: an `Err` is returned
    /// after reporting, and a panic is resumed after reporting.
    pub fn time<E, F>(&self, name: &str, action: F) -> Result<Duration, E>
    where
        F: FnOnce() -> Result<(), E>,
    {
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(action));
        let elapsed = start.elapsed();
        self.report(name, elapsed);

        match outcome {
            Ok(Ok(())) => Ok(elapsed),
            Ok(Err(e)) => Err(e),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Time an action that cannot fail
    pub fn time_infallible<F: FnOnce()>(&self, name: &str, action: F) -> Duration {
        match self.time::<std::convert::Infallible, _>(name, || {
            action();
            Ok(())
        }) {
            Ok(elapsed) => elapsed,
            Err(never) => match never {},
        }
    }

    fn report(&self, name: &str, elapsed: Duration) {
        self.sink.line("");
        self.sink.line(name);
        self.sink
            .line(&format!("Elapsed Time: {} ms", elapsed.as_millis()));
        self.sink.line("");

        if elapsed > self.slow_threshold {
            log::warn!(
                "Slow operation detected: {} took {}ms",
                name,
                elapsed.as_millis()
            );
        }
    }
}
