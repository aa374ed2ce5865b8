//! Core library for Tandem: worker pool, invoke-all, parallel range with break,
//! continuations, work queue, action timing.
//! Used by the CLI binary; can be reused by other tools.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod pool;
pub mod sink;
pub mod source;
pub mod task_queue;
pub mod timer;

// Re-export main API for CLI
pub use config::{load_config, load_config_file, Config};
pub use diagnostics::{process_thread_count, ThreadDiagnostics};
pub use error::{
    AggregateFailure, BoxError, OperationFailure, OperationResult, Result, TandemError,
};
pub use logging::init_logging;
pub use pool::{PoolConfig, WorkerPool};
pub use sink::{LogFacadeSink, LogSink, MemorySink};
pub use source::{DataSource, JsonFileSource};
pub use task_queue::{
    action, Action, Branch, Continuation, ContinuationHandle, ContinuationOutcome,
    ContinuationPipeline, Invoker, LoopResult, LoopState, ParallelQuery, QueueStats,
    RangeExecutor, WorkQueue,
};
pub use timer::ActionTimer;
