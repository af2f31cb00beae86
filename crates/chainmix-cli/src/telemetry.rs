//! Structured logging for the benchmark runner.
//!
//! Logs go to stderr through `tracing_subscriber::fmt`, filtered by
//! `RUST_LOG` (default `info`). Internals of the `chainmix` library log at
//! `debug` (per master) and `trace` (per stage, worker and repetition), so
//! e.g. `RUST_LOG=chainmix=debug` shows one line per finished master.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true),
        )
        .try_init()?;

    Ok(())
}
