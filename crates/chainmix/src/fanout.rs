//! Fan-out Controller: launches every master concurrently.

use crate::{
    BenchConfig, Result,
    factor::Factors,
    master::{RunSummary, run_master},
};
use tokio::{sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;

/// Spawns `config.num_rings` masters, each with its own worker, all sharing
/// `results`.
///
/// # Arguments
///
/// - `config`: Copied into every master.
/// - `results`: Shared results conduit. The caller's sender is consumed, so
///   the conduit closes exactly when the last master finishes.
/// - `cancel`: Shared run token, cloned into every master.
///
/// # Behavior
///
/// - Master ids run from `0` to `config.num_rings - 1`.
/// - A master that fails cancels `cancel`, which unblocks the other masters
///   and the validator instead of leaving them waiting for results that will
///   never come.
/// - Nothing is joined here; the returned set must be drained by the caller.
///
/// # Panics
///
/// Panics if called outside of a tokio runtime.
pub fn spawn_masters(
    config: &BenchConfig,
    results: mpsc::Sender<Factors>,
    cancel: &CancellationToken,
) -> JoinSet<Result<RunSummary>> {
    let mut masters = JoinSet::new();

    for master_id in 0..config.num_rings {
        let config = *config;
        let results = results.clone();
        let cancel = cancel.clone();

        masters.spawn(async move {
            let outcome = run_master(master_id, config, results, cancel.clone()).await;
            if let Err(_e) = &outcome {
                #[cfg(feature = "tracing")]
                tracing::warn!("Master {master_id} failed: {_e}");
                cancel.cancel();
            }
            outcome
        });
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("Spawned {} masters", masters.len());

    masters
}
