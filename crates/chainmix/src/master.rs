//! Run Orchestrator ("master"): drives one worker and a family of pipelines.
//!
//! Every repetition walks the same sequence of phases:
//!
//! 1. **Dispatch**: hand [`TASK_N`] to the master's Compute Worker. The
//!    worker factorizes it concurrently with the remaining phases.
//! 2. **Feed**: build a fresh [`Pipeline`], attach an exit monitor, and push
//!    tokens `initial_token, ..., 1, 0` into the entry.
//! 3. **Drain**: wait for the monitor's completion signal, then join every
//!    stage so nothing from this repetition outlives it.
//! 4. **Collect**: block on the worker's result and forward it, unmodified, to
//!    the shared results conduit.
//!
//! The collect phase blocks on the worker rather than relying on the
//! factorization finishing before the pipeline drains, so the relative speed
//! of the two never affects correctness.

use crate::{
    BenchConfig, Error, Result,
    conduit::{self, SENTINEL, Token},
    config::TASK_N,
    factor::Factors,
    pipeline::Pipeline,
    worker::ComputeWorker,
};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// What one master accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub master_id: usize,
    /// Repetitions completed (pipelines drained and results delivered).
    pub repetitions: u64,
    /// Tokens observed at pipeline exits, sentinels included.
    pub tokens_observed: u64,
    pub elapsed: Duration,
}

/// Runs `config.repetitions` repetitions for one master and returns a
/// summary once its worker has been shut down.
///
/// # Arguments
///
/// - `master_id`: Identifier for this master, also used for its worker.
/// - `config`: Pipeline shape, countdown start and repetition count.
/// - `results`: Shared results conduit; one factorization per repetition.
/// - `cancel`: Shared run token.
///
/// # Behavior
///
/// - Owns exactly one [`ComputeWorker`], spawned on entry and joined on every
///   exit path, success or failure.
/// - Each repetition builds, feeds and fully joins a fresh pipeline before the
///   worker's result is collected and forwarded.
/// - The first failing phase ends the run; a worker shutdown error after that
///   does not mask the original failure.
///
/// # Errors
///
/// - [`Error::Cancelled`] if `cancel` fires.
/// - [`Error::ChannelError`] if the results conduit or a pipeline conduit
///   closes early.
/// - [`Error::OutOfOrder`] if a pipeline reorders tokens.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(master_id = master_id)))]
pub async fn run_master(
    master_id: usize,
    config: BenchConfig,
    results: mpsc::Sender<Factors>,
    cancel: CancellationToken,
) -> Result<RunSummary> {
    let start = Instant::now();
    let mut worker = ComputeWorker::spawn(master_id, cancel.clone());

    let outcome = run_repetitions(&mut worker, &config, &results, &cancel).await;
    let stopped = worker.shutdown().await;
    let tokens_observed = outcome?;
    stopped?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "Master {master_id} done: {} repetitions in {:?}",
        config.repetitions,
        start.elapsed()
    );

    Ok(RunSummary {
        master_id,
        repetitions: config.repetitions,
        tokens_observed,
        elapsed: start.elapsed(),
    })
}

/// Dispatch, feed, drain and collect, `config.repetitions` times. Returns the
/// number of tokens seen at the pipeline exits.
async fn run_repetitions(
    worker: &mut ComputeWorker,
    config: &BenchConfig,
    results: &mpsc::Sender<Factors>,
    cancel: &CancellationToken,
) -> Result<u64> {
    let mut tokens_observed = 0;

    for _repetition in 0..config.repetitions {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            "Master {} starting repetition {_repetition}",
            worker.worker_id()
        );

        // === Dispatch ===
        worker.dispatch(TASK_N).await?;

        // === Feed ===
        tokens_observed += drive_pipeline(config, cancel).await?;

        // === Collect ===
        let factors = worker.collect().await?;
        conduit::send(results, factors, cancel, "results").await?;
    }

    Ok(tokens_observed)
}

/// Builds one pipeline, feeds it the countdown and waits until it has fully
/// drained. Returns the number of tokens seen at the exit.
async fn drive_pipeline(config: &BenchConfig, cancel: &CancellationToken) -> Result<u64> {
    let Pipeline {
        entry,
        exit,
        mut tasks,
    } = Pipeline::build(config.ring_size, config.stage_buffer_size, cancel);

    let (done_tx, done_rx) = oneshot::channel();
    let expected = config.initial_token;
    let monitor_cancel = cancel.clone();
    tasks.spawn(async move {
        let outcome = monitor_exit(exit, expected, &monitor_cancel).await;
        // The driver only stops listening once it has given up on the run.
        let _ = done_tx.send(outcome.clone());
        outcome
    });

    for token in (SENTINEL..=config.initial_token).rev() {
        if let Err(e) = conduit::send(&entry, token, cancel, "pipeline entry").await {
            // A closed entry is only a symptom; the chain knows the cause.
            drop(entry);
            return Err(tasks.join().await.err().unwrap_or(e));
        }
    }

    // === Drain ===
    let observed = conduit::wait(done_rx, cancel, "drain signal")
        .await
        .and_then(|outcome| outcome);
    // Join first so a stage failure is reported ahead of its symptom at the
    // monitor.
    tasks.join().await?;
    observed
}

/// Reads the pipeline exit until the sentinel, checking that tokens count
/// down one at a time from `first`.
async fn monitor_exit(
    mut exit: mpsc::Receiver<Token>,
    first: Token,
    cancel: &CancellationToken,
) -> Result<u64> {
    let mut expected = first;
    let mut observed = 0;

    loop {
        let token = conduit::recv_expected(&mut exit, cancel, "pipeline exit").await?;
        observed += 1;

        if token != expected {
            return Err(Error::OutOfOrder {
                expected,
                got: token,
            });
        }

        if token == SENTINEL {
            return Ok(observed);
        }
        expected -= 1;
    }
}
