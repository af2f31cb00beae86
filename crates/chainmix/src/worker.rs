//! Compute Worker: a long-lived task that factorizes one number at a time.
//!
//! A master dispatches a job, goes on to drive a pipeline, and later blocks on
//! the result. Each job carries its own one-shot reply slot, and the handle
//! refuses a second dispatch until that slot has been collected, so at most
//! one job is ever in flight per worker.

use crate::{
    Error, Result,
    conduit,
    factor::{Factors, factorize},
};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

/// A single factorization request.
struct Job {
    n: u64,
    reply: oneshot::Sender<Factors>,
}

/// Handle owned by a master for its dedicated Compute Worker.
///
/// Dropping the handle closes the input conduit, which stops the worker after
/// any in-flight job. [`ComputeWorker::shutdown`] does the same and then
/// joins the task.
pub struct ComputeWorker {
    worker_id: usize,
    input: mpsc::Sender<Job>,
    pending: Option<oneshot::Receiver<Factors>>,
    handle: JoinHandle<Result<()>>,
    cancel: CancellationToken,
}

impl ComputeWorker {
    /// Spawns a worker task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn spawn(worker_id: usize, cancel: CancellationToken) -> Self {
        let (input, jobs) = mpsc::channel(1);
        let handle = tokio::spawn(worker_loop(worker_id, jobs, cancel.clone()));

        Self {
            worker_id,
            input,
            pending: None,
            handle,
            cancel,
        }
    }

    pub const fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Returns `true` while a dispatched job has not been collected.
    pub const fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Hands `n` to the worker. Returns as soon as the worker accepted it.
    ///
    /// # Errors
    ///
    /// - [`Error::WorkerBusy`] if the previous result has not been collected.
    /// - [`Error::Cancelled`] if the run is cancelled.
    /// - [`Error::ChannelError`] if the worker has stopped.
    pub async fn dispatch(&mut self, n: u64) -> Result<()> {
        if self.pending.is_some() {
            return Err(Error::WorkerBusy {
                worker_id: self.worker_id,
            });
        }

        let (reply, result) = oneshot::channel();
        conduit::send(&self.input, Job { n, reply }, &self.cancel, "worker input").await?;
        self.pending = Some(result);
        Ok(())
    }

    /// Blocks until the factorization of the last dispatched number is ready.
    ///
    /// # Errors
    ///
    /// - [`Error::WorkerIdle`] if nothing was dispatched.
    /// - [`Error::Cancelled`] if the run is cancelled.
    /// - [`Error::ChannelError`] if the worker has stopped.
    pub async fn collect(&mut self) -> Result<Factors> {
        let result = self.pending.take().ok_or(Error::WorkerIdle {
            worker_id: self.worker_id,
        })?;
        conduit::wait(result, &self.cancel, "worker output").await
    }

    /// Dispatches `n` and waits for its factorization.
    ///
    /// # Errors
    ///
    /// See [`ComputeWorker::dispatch`] and [`ComputeWorker::collect`].
    pub async fn factorize(&mut self, n: u64) -> Result<Factors> {
        self.dispatch(n).await?;
        self.collect().await
    }

    /// Closes the input conduit and joins the worker task.
    ///
    /// An uncollected result is discarded.
    ///
    /// # Errors
    ///
    /// Returns whatever error stopped the worker, or [`Error::TaskFailed`] if
    /// the task panicked.
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            input,
            pending,
            handle,
            ..
        } = self;
        drop(input);
        drop(pending);
        handle.await?
    }
}

/// Worker task body.
///
/// Each job is factorized on the blocking pool so that CPU work never stalls
/// the runtime threads the forwarding stages are scheduled on.
///
/// # Arguments
///
/// - `worker_id`: Identifier of the owning master (used for logs/tracing).
/// - `jobs`: Receiver through which factorization requests arrive.
/// - `cancel`: Shared run token; checked around every receive and job.
///
/// # Behavior
///
/// - Replies on the job's own one-shot slot. A dropped slot means the handle
///   gave up on the result; the job is discarded and the loop goes on.
/// - Returns `Ok(())` once the input conduit closes.
/// - Returns [`Error::Cancelled`] as soon as `cancel` fires, without waiting
///   for a running factorization.
async fn worker_loop(
    _worker_id: usize,
    mut jobs: mpsc::Receiver<Job>,
    cancel: CancellationToken,
) -> Result<()> {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} started");

    while let Some(Job { n, reply }) = conduit::recv(&mut jobs, &cancel).await? {
        let job = tokio::task::spawn_blocking(move || factorize(n));
        let factors = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            joined = job => joined?,
        };

        if reply.send(factors).is_err() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Worker {_worker_id} result abandoned");
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} stopped");

    Ok(())
}
