use anyhow::bail;
use chainmix::{
    BenchConfig,
    config::{DEFAULT_RESULTS_BUFFER_SIZE, DEFAULT_STAGE_BUFFER_SIZE},
};
use clap::Parser;
use core::time::Duration;

/// Runtime configuration for the `chainmix` binary.
///
/// The four positional arguments define the workload and are always
/// required. The remaining options tune conduit capacities and the runtime,
/// and may also be supplied through environment variables (or a `.env`
/// file).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "chainmix",
    version,
    about = "Mixed-case benchmark: token-forwarding chains alongside factorization workers"
)]
pub struct CliArgs {
    /// Number of masters (chains of pipelines) run concurrently.
    pub num_rings: usize,

    /// Number of forwarding stages in each pipeline. `0` builds a
    /// pass-through pipeline whose exit is its own entry.
    pub ring_size: usize,

    /// First token fed into each pipeline. Tokens count down to the `0`
    /// sentinel, so `initial_token + 1` tokens cross every stage.
    pub initial_token: u64,

    /// Pipelines built, and factorizations performed, per master.
    pub repetitions: u64,

    /// Capacity of every pipeline conduit.
    ///
    /// Environment variable: `STAGE_BUFFER_SIZE`
    #[arg(long, env = "STAGE_BUFFER_SIZE", default_value_t = DEFAULT_STAGE_BUFFER_SIZE)]
    pub stage_buffer_size: usize,

    /// Capacity of the results conduit shared by all masters.
    ///
    /// Environment variable: `RESULTS_BUFFER_SIZE`
    #[arg(long, env = "RESULTS_BUFFER_SIZE", default_value_t = DEFAULT_RESULTS_BUFFER_SIZE)]
    pub results_buffer_size: usize,

    /// Number of runtime worker threads. Defaults to the number of CPUs.
    ///
    /// Environment variable: `WORKER_THREADS`
    #[arg(long, env = "WORKER_THREADS")]
    pub worker_threads: Option<usize>,

    /// Abort the run if it has not completed after this many seconds.
    ///
    /// Environment variable: `TIMEOUT_SECS`
    #[arg(long, env = "TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub bench: BenchConfig,
    pub worker_threads: usize,
    pub timeout: Option<Duration>,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let worker_threads = args.worker_threads.unwrap_or_else(num_cpus::get);
        if worker_threads == 0 {
            bail!("WORKER_THREADS must be greater than 0");
        }

        if args.timeout_secs == Some(0) {
            bail!("TIMEOUT_SECS must be greater than 0");
        }

        let bench = BenchConfig {
            stage_buffer_size: args.stage_buffer_size,
            results_buffer_size: args.results_buffer_size,
            ..BenchConfig::new(
                args.num_rings,
                args.ring_size,
                args.initial_token,
                args.repetitions,
            )
        };
        bench.validate()?;

        Ok(Self {
            bench,
            worker_threads,
            timeout: args.timeout_secs.map(Duration::from_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(core::iter::once("chainmix").chain(args.iter().copied()))
    }

    #[test]
    fn parses_positionals_with_defaults() {
        let args = parse(&["3", "5", "100", "2"]).expect("valid args");
        assert_eq!(args.num_rings, 3);
        assert_eq!(args.ring_size, 5);
        assert_eq!(args.initial_token, 100);
        assert_eq!(args.repetitions, 2);

        let config = CliConfig::try_from(args).expect("valid config");
        assert_eq!(config.bench, BenchConfig::new(3, 5, 100, 2));
        assert!(config.worker_threads > 0);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn accepts_tuning_options() {
        let args = parse(&[
            "1",
            "0",
            "0",
            "1",
            "--stage-buffer-size",
            "4",
            "--results-buffer-size",
            "2",
            "--worker-threads",
            "3",
            "--timeout-secs",
            "60",
        ])
        .expect("valid args");

        let config = CliConfig::try_from(args).expect("valid config");
        assert_eq!(config.bench.stage_buffer_size, 4);
        assert_eq!(config.bench.results_buffer_size, 2);
        assert_eq!(config.worker_threads, 3);
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn wrong_argument_count_is_a_usage_error() {
        let err = parse(&["1", "2", "3"]).expect_err("missing repetitions");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = parse(&["1", "2", "3", "4", "5"]).expect_err("extra argument");
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = parse(&["one", "2", "3", "4"]).expect_err("non-numeric");
        assert_eq!(err.kind(), ErrorKind::ValueValidation);

        assert!(parse(&["1", "2", "-3", "4"]).is_err(), "negative accepted");
    }

    #[test]
    fn rejects_zero_capacities_and_threads() {
        for extra in [
            ["--stage-buffer-size", "0"],
            ["--results-buffer-size", "0"],
            ["--worker-threads", "0"],
            ["--timeout-secs", "0"],
        ] {
            let args = parse(&["1", "1", "1", "1", extra[0], extra[1]]).expect("parses");
            assert!(CliConfig::try_from(args).is_err(), "{extra:?} accepted");
        }
    }
}
