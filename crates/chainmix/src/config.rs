use crate::{Error, Result};

/// First prime factor of [`TASK_N`].
pub const FACTOR_1: u64 = 86_028_157;

/// Second prime factor of [`TASK_N`].
pub const FACTOR_2: u64 = 329_545_133;

/// The composite every Compute Worker factorizes once per repetition.
pub const TASK_N: u64 = FACTOR_1 * FACTOR_2;

/// Capacity of each pipeline conduit (entry and every stage output).
pub const DEFAULT_STAGE_BUFFER_SIZE: usize = 128;

/// Capacity of the results conduit shared by all masters.
pub const DEFAULT_RESULTS_BUFFER_SIZE: usize = 32;

/// Parameters of one benchmark invocation.
///
/// The first four fields are the positional benchmark arguments; the buffer
/// sizes only tune conduit capacities and default to the values the benchmark
/// has always used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchConfig {
    /// Number of masters running concurrently, each with its own worker.
    pub num_rings: usize,
    /// Number of forwarding stages in every pipeline.
    pub ring_size: usize,
    /// First token fed into each pipeline; tokens count down to the sentinel.
    pub initial_token: u64,
    /// Pipelines built (and factorizations performed) per master.
    pub repetitions: u64,
    pub stage_buffer_size: usize,
    pub results_buffer_size: usize,
}

impl BenchConfig {
    /// Creates a config with the default conduit capacities.
    #[must_use]
    pub const fn new(
        num_rings: usize,
        ring_size: usize,
        initial_token: u64,
        repetitions: u64,
    ) -> Self {
        Self {
            num_rings,
            ring_size,
            initial_token,
            repetitions,
            stage_buffer_size: DEFAULT_STAGE_BUFFER_SIZE,
            results_buffer_size: DEFAULT_RESULTS_BUFFER_SIZE,
        }
    }

    /// Total number of results the validator must receive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `num_rings * repetitions` does not
    /// fit in a `u64`.
    pub fn expected_results(&self) -> Result<u64> {
        (self.num_rings as u64)
            .checked_mul(self.repetitions)
            .ok_or_else(|| Error::InvalidConfig {
                reason: format!(
                    "num_rings ({}) * repetitions ({}) overflows",
                    self.num_rings, self.repetitions
                ),
            })
    }

    /// Checks that the benchmark can be run with these parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a conduit capacity is zero or the
    /// result count overflows.
    pub fn validate(&self) -> Result<()> {
        if self.stage_buffer_size == 0 {
            return Err(Error::InvalidConfig {
                reason: "stage buffer size must be greater than 0".to_string(),
            });
        }

        if self.results_buffer_size == 0 {
            return Err(Error::InvalidConfig {
                reason: "results buffer size must be greater than 0".to_string(),
            });
        }

        self.expected_results().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_is_consistent() {
        assert_eq!(TASK_N, 28_350_160_440_309_881);
    }

    #[test]
    fn new_uses_default_capacities() {
        let config = BenchConfig::new(3, 5, 100, 2);
        assert_eq!(config.stage_buffer_size, DEFAULT_STAGE_BUFFER_SIZE);
        assert_eq!(config.results_buffer_size, DEFAULT_RESULTS_BUFFER_SIZE);
        assert_eq!(config.expected_results(), Ok(6));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn zero_runs_are_valid() {
        let config = BenchConfig::new(0, 10, 10, 10);
        assert_eq!(config.expected_results(), Ok(0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_capacities() {
        let mut config = BenchConfig::new(1, 1, 1, 1);
        config.stage_buffer_size = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));

        let mut config = BenchConfig::new(1, 1, 1, 1);
        config.results_buffer_size = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn rejects_overflowing_result_count() {
        let config = BenchConfig::new(usize::MAX, 1, 1, u64::MAX);
        assert!(matches!(
            config.expected_results(),
            Err(Error::InvalidConfig { .. })
        ));
    }
}
