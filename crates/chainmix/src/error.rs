//! Error types for the mixed-case benchmark.
//!
//! This module defines the central `Error` enum, which captures every way a
//! benchmark run can stop early. None of these are retried: a run is
//! all-or-nothing, and a wrong result means the message passing itself is
//! broken.
//!
//! ## Error Cases
//! - `ChannelError`: A conduit closed while a task still expected to use it.
//! - `WorkerBusy`: A job was dispatched before the previous result was read.
//! - `WorkerIdle`: A result was collected with no job in flight.
//! - `TaskFailed`: A spawned task panicked or was aborted before joining.
//! - `InvalidResult`: A delivered factorization did not match the fixture.
//! - `OutOfOrder`: A pipeline emitted a token out of sequence.
//! - `ResultCount`: The results conduit delivered too few or too many results.
//! - `InvalidConfig`: The benchmark parameters cannot be run.
//! - `Cancelled`: The shared cancellation token fired.

use tokio::task::JoinError;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the benchmark.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Internal channel send/receive failure (closed sender or receiver).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The worker still holds an uncollected job.
    #[error("Worker {worker_id} is busy: collect the previous result first")]
    WorkerBusy { worker_id: usize },

    /// Nothing was dispatched to the worker.
    #[error("Worker {worker_id} has no job in flight")]
    WorkerIdle { worker_id: usize },

    /// A spawned task could not be joined.
    #[error("Task failed: {context}")]
    TaskFailed { context: String },

    /// A factorization result did not match the expected fixture.
    #[error("Wrong factorization result: {factors:?}")]
    InvalidResult { factors: Vec<u64> },

    /// A pipeline emitted a token other than the one that was due.
    #[error("Token out of order: expected {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },

    /// The validator saw a different number of results than were scheduled.
    #[error("Expected {expected} results, received {received}")]
    ResultCount { expected: u64, received: u64 },

    /// The benchmark parameters were rejected.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The run was cancelled before it completed.
    #[error("Benchmark cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn channel(context: impl Into<String>) -> Self {
        Self::ChannelError {
            context: context.into(),
        }
    }
}

impl From<JoinError> for Error {
    fn from(err: JoinError) -> Self {
        let context = if err.is_cancelled() {
            "task was aborted".to_string()
        } else {
            format!("task panicked: {err}")
        };
        Self::TaskFailed { context }
    }
}
