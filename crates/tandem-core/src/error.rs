//! Error taxonomy for tandem.
//! A single unit of work fails with an `OperationFailure`; fan-outs (invoke-all,
//! parallel range) collect every failure into one `AggregateFailure`.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

/// Boxed error raised by a unit of work.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What a unit of work returns.
pub type OperationResult = std::result::Result<(), BoxError>;

/// One unit of work raised, either by returning `Err` or by panicking.
#[derive(Debug, Error)]
pub enum OperationFailure {
    #[error("operation {index} failed: {source}")]
    Failed {
        /// Position in the invoked sequence, or the loop index.
        index: i64,
        #[source]
        source: BoxError,
    },
    #[error("operation {index} panicked: {message}")]
    Panicked { index: i64, message: String },
}

impl OperationFailure {
    pub fn index(&self) -> i64 {
        match self {
            OperationFailure::Failed { index, .. } | OperationFailure::Panicked { index, .. } => {
                *index
            }
        }
    }

    pub(crate) fn from_panic(index: i64, payload: Box<dyn Any + Send>) -> Self {
        OperationFailure::Panicked {
            index,
            message: panic_message(payload.as_ref()),
        }
    }
}

/// Every failure observed during one fan-out. Never empty.
#[derive(Debug)]
pub struct AggregateFailure {
    failures: Vec<OperationFailure>,
}

impl AggregateFailure {
    /// Returns `None` when nothing failed.
    pub fn from_failures(mut failures: Vec<OperationFailure>) -> Option<Self> {
        if failures.is_empty() {
            return None;
        }
        failures.sort_by_key(OperationFailure::index);
        Some(Self { failures })
    }

    pub fn failures(&self) -> &[OperationFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<OperationFailure> {
        self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} operation(s) failed", self.failures.len())?;
        if let Some(first) = self.failures.first() {
            write!(f, ": {}", first)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFailure {}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum TandemError {
    #[error(transparent)]
    Aggregate(#[from] AggregateFailure),

    #[error("invalid range: start {start} is greater than end {end}")]
    InvalidRange { start: i64, end: i64 },

    #[error("worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TandemError>;

/// Run one unit of work, turning `Err` and panics into an `OperationFailure`.
pub(crate) fn run_guarded<F>(index: i64, op: F) -> std::result::Result<(), OperationFailure>
where
    F: FnOnce() -> OperationResult,
{
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(OperationFailure::Failed { index, source }),
        Err(payload) => Err(OperationFailure::from_panic(index, payload)),
    }
}

/// Flatten an error raised by a producer: an aggregate yields its members,
/// anything else becomes a single failure at `index`.
pub(crate) fn flatten_failure(index: i64, err: BoxError) -> Vec<OperationFailure> {
    match err.downcast::<AggregateFailure>() {
        Ok(aggregate) => (*aggregate).into_failures(),
        Err(err) => match err.downcast::<TandemError>() {
            Ok(tandem) => match *tandem {
                TandemError::Aggregate(aggregate) => aggregate.into_failures(),
                other => vec![OperationFailure::Failed {
                    index,
                    source: Box::new(other),
                }],
            },
            Err(source) => vec![OperationFailure::Failed { index, source }],
        },
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
