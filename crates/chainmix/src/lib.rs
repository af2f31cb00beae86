#![doc = include_str!("../README.md")]

pub mod bench;
pub mod conduit;
pub mod config;
mod error;
pub mod factor;
pub mod fanout;
pub mod master;
pub mod pipeline;
pub mod stage;
pub mod validate;
pub mod worker;

pub use bench::{BenchReport, run_benchmark};
pub use config::BenchConfig;
pub use error::{Error, Result};
pub use factor::{Factors, factorize};
// Re-exported so callers can build the token passed to `run_benchmark`
// without depending on `tokio-util` themselves.
pub use tokio_util::sync::CancellationToken;
