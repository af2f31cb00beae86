//! Benchmark driver: fan-out, validation and teardown of one full run.

use crate::{
    BenchConfig, Error, Result,
    fanout::spawn_masters,
    master::RunSummary,
    validate::{collect_results, ensure_drained},
};
use std::time::{Duration, Instant};
use tokio::{sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;

/// Outcome of a successful benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchReport {
    /// Results received and checked; always `num_rings * repetitions`.
    pub results_validated: u64,
    /// Per-master summaries, ordered by master id.
    pub runs: Vec<RunSummary>,
    pub elapsed: Duration,
}

impl BenchReport {
    /// Tokens observed at pipeline exits across every master.
    pub fn tokens_observed(&self) -> u64 {
        self.runs.iter().map(|run| run.tokens_observed).sum()
    }
}

/// Runs the whole benchmark: launches the masters, validates every result
/// and joins every master before reporting success.
///
/// Must be called from within a multi-threaded tokio runtime for the stages
/// and workers to actually run in parallel.
///
/// # Errors
///
/// - [`Error::InvalidConfig`] if `config` is rejected by
///   [`BenchConfig::validate`].
/// - [`Error::InvalidResult`] or [`Error::ResultCount`] if validation fails.
/// - [`Error::Cancelled`] if `cancel` fires before the run completes.
/// - Any error a master failed with.
pub async fn run_benchmark(config: BenchConfig, cancel: CancellationToken) -> Result<BenchReport> {
    config.validate()?;
    let expected = config.expected_results()?;
    let start = Instant::now();

    let (results_tx, mut results_rx) = mpsc::channel(config.results_buffer_size);
    let mut masters = spawn_masters(&config, results_tx, &cancel);

    let results_validated = match collect_results(&mut results_rx, expected, &cancel).await {
        Ok(validated) => validated,
        Err(e) => {
            // Stop everything still running; a master's own error explains
            // the shortfall better than the validator's view of it.
            cancel.cancel();
            let master_err = join_masters(&mut masters).await.err();
            return Err(match (e, master_err) {
                (Error::Cancelled | Error::ResultCount { .. }, Some(master_err)) => master_err,
                (e, _) => e,
            });
        }
    };

    let mut runs = join_masters(&mut masters).await?;
    ensure_drained(&mut results_rx, expected)?;
    runs.sort_unstable_by_key(|run| run.master_id);

    Ok(BenchReport {
        results_validated,
        runs,
        elapsed: start.elapsed(),
    })
}

/// Joins every master, returning their summaries or the most informative
/// failure: any error other than [`Error::Cancelled`] wins, since
/// cancellation is usually the consequence of another master failing.
async fn join_masters(masters: &mut JoinSet<Result<RunSummary>>) -> Result<Vec<RunSummary>> {
    let mut runs = Vec::with_capacity(masters.len());
    let mut failure: Option<Error> = None;

    while let Some(joined) = masters.join_next().await {
        match joined.map_err(Error::from).and_then(|res| res) {
            Ok(summary) => runs.push(summary),
            Err(e) => {
                if matches!(failure, None | Some(Error::Cancelled)) {
                    failure = Some(e);
                }
            }
        }
    }

    failure.map_or(Ok(runs), Err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn single_ring_empty_chain() -> Result<()> {
        let report = run_benchmark(BenchConfig::new(1, 0, 0, 1), CancellationToken::new()).await?;
        assert_eq!(report.results_validated, 1);
        assert_eq!(report.runs.len(), 1);
        assert_eq!(report.tokens_observed(), 1);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn three_rings_of_five() -> Result<()> {
        let report =
            run_benchmark(BenchConfig::new(3, 5, 100, 2), CancellationToken::new()).await?;
        assert_eq!(report.results_validated, 6);
        let ids: Vec<usize> = report.runs.iter().map(|run| run.master_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(report.runs.iter().all(|run| run.repetitions == 2));
        assert_eq!(report.tokens_observed(), 6 * 101);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn more_rings_than_result_slots() -> Result<()> {
        let mut config = BenchConfig::new(8, 3, 50, 2);
        config.results_buffer_size = 1;
        config.stage_buffer_size = 2;
        let report = run_benchmark(config, CancellationToken::new()).await?;
        assert_eq!(report.results_validated, 16);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn nothing_to_run() -> Result<()> {
        let report = run_benchmark(BenchConfig::new(0, 5, 5, 5), CancellationToken::new()).await?;
        assert_eq!(report.results_validated, 0);
        assert!(report.runs.is_empty());

        let report = run_benchmark(BenchConfig::new(2, 5, 5, 0), CancellationToken::new()).await?;
        assert_eq!(report.results_validated, 0);
        assert_eq!(report.runs.len(), 2);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn invalid_config_starts_nothing() {
        let config = BenchConfig {
            stage_buffer_size: 0,
            ..BenchConfig::new(1, 1, 1, 1)
        };
        assert!(matches!(
            run_benchmark(config, CancellationToken::new()).await,
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancellation_aborts_the_run() {
        let cancel = CancellationToken::new();
        let run = tokio::spawn(run_benchmark(
            BenchConfig::new(4, 100, 1_000_000, 1_000),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let outcome = run.await.expect("benchmark task");
        assert_eq!(outcome, Err(Error::Cancelled));
    }
}
