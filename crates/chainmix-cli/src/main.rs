#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use chainmix::{BenchReport, CancellationToken, run_benchmark};
use clap::Parser;
use config::{CliArgs, CliConfig};
use telemetry::init_telemetry;
use tokio::{runtime::Builder, signal};

// Using mimalloc for better performance under contention
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let runtime = Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()?;

    let report = runtime.block_on(run(config))?;
    log_report(&report);
    Ok(())
}

async fn run(config: CliConfig) -> anyhow::Result<BenchReport> {
    let cancel = CancellationToken::new();
    let watchdog = tokio::spawn(cancel_on_signal(cancel.clone(), config.timeout));

    let outcome = run_benchmark(config.bench, cancel).await;
    watchdog.abort();

    Ok(outcome?)
}

fn log_startup_info(config: &CliConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting benchmark with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting benchmark: {} rings x {} stages, {} tokens, {} repetitions on {} threads",
            config.bench.num_rings,
            config.bench.ring_size,
            config.bench.initial_token,
            config.bench.repetitions,
            config.worker_threads
        );
    }
}

fn log_report(report: &BenchReport) {
    tracing::info!(
        "Validated {} results from {} masters ({} tokens observed) in {:?}",
        report.results_validated,
        report.runs.len(),
        report.tokens_observed(),
        report.elapsed
    );

    if let Some(slowest) = report.runs.iter().max_by_key(|run| run.elapsed) {
        tracing::debug!(
            "Slowest master {} finished in {:?}",
            slowest.master_id,
            slowest.elapsed
        );
    }
}

/// Cancels the benchmark on Ctrl+C, SIGTERM or when `timeout` elapses.
async fn cancel_on_signal(cancel: CancellationToken, timeout: Option<core::time::Duration>) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    let deadline = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
        () = deadline => tracing::warn!("Benchmark timed out after {:?}", timeout.unwrap_or_default()),
    }

    tracing::info!("Cancelling benchmark...");
    cancel.cancel();
}
