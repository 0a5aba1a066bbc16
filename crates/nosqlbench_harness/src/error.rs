//! Error types for the scenario harness.

use nosqlbench_core::CoreError;
use thiserror::Error;

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can occur while configuring or running a scenario.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The executor was used out of lifecycle order.
    #[error("usage error: {message}")]
    Usage {
        /// Description of the misuse.
        message: String,
    },

    /// A configuration value is out of range or malformed.
    #[error("config error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// A store operation failed inside a task.
    #[error("store error: {0}")]
    Store(#[from] CoreError),

    /// One or more tasks failed; wraps the first failure.
    #[error("{failed} task(s) failed, first: {source}")]
    TaskFailed {
        /// Number of failed tasks.
        failed: usize,
        /// Cause reported by the first failing task.
        #[source]
        source: Box<HarnessError>,
    },

    /// A task panicked.
    #[error("task {task} panicked: {message}")]
    TaskPanicked {
        /// Submission index of the task.
        task: usize,
        /// Panic payload, if it was a string.
        message: String,
    },

    /// A workload found the store in a state it cannot continue from.
    #[error("workload error: {message}")]
    Workload {
        /// Description of the problem.
        message: String,
    },

    /// The run was cancelled before every task completed.
    #[error("scenario cancelled")]
    Cancelled,

    /// A worker thread could not be spawned.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Creates a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a workload error.
    pub fn workload(message: impl Into<String>) -> Self {
        Self::Workload {
            message: message.into(),
        }
    }

    /// Returns the store error at the root of this error, if any.
    pub fn store_error(&self) -> Option<&CoreError> {
        match self {
            Self::Store(err) => Some(err),
            Self::TaskFailed { source, .. } => source.store_error(),
            _ => None,
        }
    }
}
