//! One function per demo subcommand. Each compares or exercises one tandem-core primitive.

use std::path::Path;
use std::thread;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tandem_core::{
    action, process_thread_count, ActionTimer, Branch, BoxError, ContinuationPipeline,
    DataSource, Invoker, JsonFileSource, LogSink, ParallelQuery, RangeExecutor, TandemError,
    ThreadDiagnostics, WorkQueue, WorkerPool,
};

use crate::console::{self, ConsoleSink};
use crate::pokedex::Pokemon;

/// Shared state for a demo run
pub struct Demo {
    pool: WorkerPool,
    timer: ActionTimer<ConsoleSink>,
}

impl Demo {
    pub fn new(pool: WorkerPool, sink: ConsoleSink, slow_operation_ms: u64) -> Self {
        let timer =
            ActionTimer::new(sink).with_slow_threshold(Duration::from_millis(slow_operation_ms));
        Self { pool, timer }
    }

    fn sink(&self) -> ConsoleSink {
        *self.timer.sink()
    }

    fn time(
        &self,
        name: &str,
        action: impl FnOnce() -> Result<(), TandemError>,
    ) -> Result<Duration, String> {
        self.timer.time(name, action).map_err(|e| e.to_string())
    }

    fn summary(&self, sequential: Duration, parallel: Duration) {
        console::info(&format!(
            "Sequential: {} ms, parallel: {} ms on {} workers",
            sequential.as_millis(),
            parallel.as_millis(),
            self.pool.worker_count()
        ));
    }

    // ---- Parallel invoke ----

    /// Cook sequentially, then with both steps invoked in parallel.
    pub fn cook(&self, unit: Duration) -> Result<(), String> {
        let sink = self.sink();
        let invoker = Invoker::new(self.pool.clone());

        let sequential = self.time("SequentialExecution", || {
            cook_pasta(&sink, unit);
            braise_sauce(&sink, unit);
            serve(&sink);
            Ok(())
        })?;

        let parallel = self.time("ParallelExecution", || {
            invoker.invoke_all(vec![
                action(|| {
                    cook_pasta(&sink, unit);
                    Ok(())
                }),
                action(|| {
                    braise_sauce(&sink, unit);
                    Ok(())
                }),
            ])?;
            serve(&sink);
            Ok(())
        })?;

        self.summary(sequential, parallel);
        Ok(())
    }

    // ---- Parallel for ----

    /// Process `[0, count)` sequentially, then with the range executor.
    pub fn process(&self, count: i64, delay: Duration) -> Result<(), String> {
        let sink = self.sink();
        let range = RangeExecutor::new(self.pool.clone());

        let sequential = self.time("SequentiallyProcess", || {
            for i in 0..count {
                process_value(&sink, i, delay);
            }
            Ok(())
        })?;

        let progress = progress_bar(&sink, count);
        let parallel = self.time("ParallelProcess", || {
            range.for_range(0, count, |i, _| {
                process_value(&sink, i, delay);
                progress.inc(1);
                Ok(())
            })?;
            Ok(())
        })?;
        progress.finish_and_clear();

        self.summary(sequential, parallel);
        Ok(())
    }

    /// Parallel loop that requests a break when it reaches `at`.
    pub fn break_loop(&self, at: i64, count: i64, delay: Duration) -> Result<(), String> {
        let sink = self.sink();
        let range = RangeExecutor::new(self.pool.clone());

        let result = range
            .for_range(0, count, |i, state| {
                if i == at {
                    state.request_break();
                }
                process_value(&sink, i, delay);
                Ok(())
            })
            .map_err(|e| e.to_string())?;

        console::info(&format!("Executed all items? {}", result.is_completed()));
        console::info(&format!(
            "Lowest Break Iteration: {}",
            result
                .lowest_break_index()
                .map(|i| i.to_string())
                .unwrap_or_else(|| "none".to_string())
        ));
        Ok(())
    }

    // ---- Waiting tasks ----

    /// Start `runners` runners together and wait for all of them.
    pub fn race(&self, runners: usize, delay: Duration) -> Result<(), String> {
        let sink = self.sink();
        let invoker = Invoker::new(self.pool.clone());

        print_thread_count();
        let ops = (0..runners).map(|n| {
            action(move || {
                sink.line(&format!("Runner {} run", n));
                thread::sleep(delay);
                sink.line(&format!("Runner {} finished", n));
                Ok(())
            })
        });
        invoker.invoke_all(ops).map_err(|e| e.to_string())?;
        print_thread_count();

        console::success(&format!("All {} runners finished.", runners));
        Ok(())
    }

    /// Producer followed by a success or failure continuation.
    pub fn continuation(&self, succeed: bool) -> Result<(), String> {
        let sink = self.sink();
        let pipeline = ContinuationPipeline::new(self.pool.clone());

        let handle = pipeline.run_with_continuations(
            move || -> Result<(), BoxError> {
                sink.line("Hello");
                if succeed {
                    Ok(())
                } else {
                    Err("Ops! An error occurred!".into())
                }
            },
            move |_| {
                sink.line("World!");
                Ok(())
            },
            |errors| {
                for e in &errors {
                    console::error(&e.to_string());
                }
                Ok(())
            },
        );
        console::dim("Continuation scheduled; caller thread is free.");

        match handle.wait() {
            Branch::Success => console::success("Producer succeeded."),
            Branch::Failure => console::info("Producer failed; failure continuation ran."),
            Branch::Unobserved => return Err("Continuation failed unobserved.".to_string()),
        }
        Ok(())
    }

    // ---- Thread pool queue ----

    /// Queue `count` items on the pool, each printing its thread diagnostics.
    pub fn queue(&self, count: usize, delay: Duration) -> Result<(), String> {
        let sink = self.sink();
        let queue = WorkQueue::new(self.pool.clone());

        for i in 0..count {
            queue.enqueue(i, move |param| {
                execute_with_parameter(&sink, param, delay);
                Ok(())
            });
        }
        queue.wait_idle();

        let stats = queue.stats();
        console::success(&format!(
            "Queued {} item(s): {} completed, {} failed.",
            stats.enqueued, stats.completed, stats.failed
        ));
        Ok(())
    }

    // ---- Parallel query ----

    /// Print record names, in parallel with a fixed degree unless `sequential`.
    pub fn names(
        &self,
        data: &Path,
        degree: usize,
        sequential: bool,
        lang: &str,
    ) -> Result<(), String> {
        let sink = self.sink();
        let records = JsonFileSource::<Pokemon>::new(data)
            .records()
            .map_err(|e| format!("Failed to read {}: {}", data.display(), e))?;

        let select = |p: Pokemon| {
            let name = match lang {
                "japanese" => p.name.japanese,
                "chinese" => p.name.chinese,
                "french" => p.name.french,
                _ => p.name.english,
            };
            (p.id, name, p.base.total())
        };

        let query = ParallelQuery::new(records);
        let rows = if sequential {
            query.map_sequential(select)
        } else {
            query
                .with_degree(degree)
                .map(select)
                .map_err(|e| e.to_string())?
        };

        for (id, name, total) in &rows {
            sink.line(&format!("Pokemon : {} (#{}, base total {})", name, id, total));
        }
        console::success(&format!("{} record(s).", rows.len()));
        Ok(())
    }
}

fn progress_bar(sink: &ConsoleSink, len: i64) -> ProgressBar {
    if !sink.is_quiet() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len.max(0) as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        bar.set_style(style);
    }
    bar
}

fn print_thread_count() {
    let count = process_thread_count()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    console::dim(&format!("Threads Count: {}", count));
}

fn cook_pasta(sink: &ConsoleSink, unit: Duration) {
    sink.line("Cooking the perfect pasta...");
    thread::sleep(unit * 2);
    sink.line("The pasta is already cooked!");
}

fn braise_sauce(sink: &ConsoleSink, unit: Duration) {
    sink.line("Braising Sauce...");
    thread::sleep(unit);
    sink.line("The Sauce is done!");
}

fn serve(sink: &ConsoleSink) {
    sink.line("Transfer Cooked Pasta to Sauce.");
    sink.line("Enjoy It!");
}

fn process_value(sink: &ConsoleSink, value: i64, delay: Duration) {
    sink.line(&format!("Starting to process {} value", value));
    thread::sleep(delay);
    sink.line(&format!("Finishing to process {} value", value));
}

fn execute_with_parameter(sink: &ConsoleSink, param: usize, delay: Duration) {
    sink.line("");
    for line in ThreadDiagnostics::capture().lines() {
        sink.line(&line);
    }
    sink.line(&format!("Execution Start: {}", param));
    thread::sleep(delay);
    sink.line(&format!("Execution End: {}", param));
}
