//! Parallel execution engine on top of an explicit rayon pool.
//!
//! Blocking fan-outs (`Invoker`, `RangeExecutor`) use scoped spawns so bodies may
//! borrow from the caller; fire-and-forget dispatch (`WorkQueue`,
//! `ContinuationPipeline`) uses the pool's own task queue.

mod continuation;
mod invoke;
mod parallel;
mod queue;
mod range;

pub use continuation::{
    Branch, Continuation, ContinuationHandle, ContinuationOutcome, ContinuationPipeline,
    UNOBSERVED_TARGET,
};
pub use invoke::{action, Action, Invoker};
pub use parallel::ParallelQuery;
pub use queue::{QueueStats, WorkQueue};
pub use range::{LoopResult, LoopState, RangeExecutor};
